// Quick diagnostic: check that a pasted YouTube Music header blob is usable
// Run: cargo run --bin ytmusic_check -- headers.txt ["search query"]
// Reads the headers from stdin when no file is given.

use std::io::Read;
use tunetransfer::catalog::TargetCatalog;
use tunetransfer::config::Config;
use tunetransfer::headers::normalize;
use tunetransfer::ytmusic::YtMusicSession;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let path = args.next().filter(|p| p != "-");
    let query = args
        .next()
        .unwrap_or_else(|| "Someone Like You Adele".to_string());

    let raw = match path {
        Some(ref path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).map(|_| buf)
        }
    };
    let raw = match raw {
        Ok(raw) => raw,
        Err(e) => {
            println!("   FAIL: could not read headers: {}", e);
            std::process::exit(1);
        }
    };

    // 1. Normalize
    println!("1. Normalizing headers...");
    let headers = match normalize(&raw) {
        Ok(headers) => headers,
        Err(e) => {
            println!("   FAIL: {}", e);
            std::process::exit(1);
        }
    };
    println!("   OK. {} headers:", headers.len());
    for name in headers.names() {
        println!("       {}", name);
    }

    // 2. Build session
    println!("\n2. Building YouTube Music session...");
    let base = Config::from_env()
        .map(|c| c.ytmusic_api_base)
        .unwrap_or_else(|_| tunetransfer::config::DEFAULT_YTMUSIC_API_BASE.to_string());
    let session = match YtMusicSession::from_headers(&base, &headers) {
        Ok(session) => session,
        Err(e) => {
            println!("   FAIL: {}", e);
            std::process::exit(1);
        }
    };
    println!("   OK.");

    // 3. Search
    println!("\n3. Searching songs for \"{}\"...", query);
    match session.search_songs(&query).await {
        Ok(results) => match results.first() {
            Some(first) => {
                println!("   OK. {} results", results.len());
                println!("       First: {} ({})", first.title, first.video_id);
                println!("\n   SUCCESS - these headers can be used for a migration.");
            }
            None => println!("   No results. The session works but found nothing."),
        },
        Err(e) => {
            println!("   FAIL: {}", e);
            println!("\n   FAILED - the headers were accepted locally but rejected by YouTube Music.");
            std::process::exit(1);
        }
    }
}
