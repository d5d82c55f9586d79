//! Convert a handful of URLs to BibTeX using the library.
//!
//! Run with `cargo run --example convert_urls`, optionally passing URLs:
//! `cargo run --example convert_urls -- https://github.com/psf/requests`

use url_bibtex::config::load_config;
use url_bibtex::Converter;

const SAMPLE_URLS: &[&str] = &[
    "https://arxiv.org/abs/2103.15348",
    "https://doi.org/10.1038/nature12373",
    "https://openreview.net/forum?id=YicbFdNTTy",
    "https://github.com/huggingface/transformers",
    "ftp://example.com/not-supported",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(None)?;
    let converter = Converter::with_default_handlers(&config)?;

    println!("Registered {} handlers", converter.registry().len());
    for handler in converter.list_handlers() {
        println!("  {} - {}", handler.id, handler.name);
    }
    println!();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let urls: Vec<&str> = if args.is_empty() {
        SAMPLE_URLS.to_vec()
    } else {
        args.iter().map(String::as_str).collect()
    };

    for url in urls {
        match converter.convert(url).await {
            Ok(bibtex) => println!("{}\n", bibtex),
            Err(e) => eprintln!("{}: {}\n", url, e),
        }
    }

    Ok(())
}
