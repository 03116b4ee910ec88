// ABOUTME: CLI binary for the headlines pipeline.
// ABOUTME: Fetches a URL (or reads an HTML file), extracts headlines with the chosen strategy and prints them.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use headlines::{default_preset, load_builtin_presets, Headlines, Pipeline, StrategyKind};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "headlines")]
#[command(about = "Fetch a web page and extract its headlines")]
struct Args {
    /// Page to fetch (default: the built-in site)
    #[arg()]
    url: Option<String>,

    /// Extraction strategy: pattern, xpath or css
    #[arg(short = 's', long = "strategy", default_value = "css")]
    strategy: StrategyKind,

    /// HTML file to extract from instead of fetching
    #[arg(long = "html", conflicts_with = "url")]
    html: Option<PathBuf>,

    /// Content-Type used as the charset hint for --html
    #[arg(long = "content-type", requires = "html")]
    content_type: Option<String>,

    /// Override the regex used by the pattern strategy
    #[arg(long = "pattern")]
    pattern: Option<String>,

    /// Override the node path used by the xpath strategy
    #[arg(long = "xpath")]
    xpath: Option<String>,

    /// Override the selector used by the css strategy
    #[arg(long = "css")]
    css: Option<String>,

    /// Attribute read off matched elements
    #[arg(long = "attr")]
    attr: Option<String>,

    /// Fetch deadline in seconds
    #[arg(long = "timeout", default_value_t = 30)]
    timeout: u64,

    /// User-Agent header to send
    #[arg(long = "user-agent")]
    user_agent: Option<String>,

    /// Output a JSON array instead of lines
    #[arg(long = "json")]
    json_output: bool,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Print elapsed time in ms to stderr
    #[arg(long = "timing")]
    timing: bool,

    /// Log debug events to stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "headlines=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn format_output(headlines: &Headlines, json_output: bool) -> String {
    if json_output {
        serde_json::to_string_pretty(headlines).unwrap_or_else(|_| "[]".to_string())
    } else {
        headlines
            .iter()
            .map(|h| format!("fetched news: {}", h))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let url = args.url.clone().unwrap_or_else(|| default_preset().url);

    // Site queries: the preset for the URL's host, else the default site, then flag overrides.
    let mut preset = load_builtin_presets()
        .for_url(&url)
        .cloned()
        .unwrap_or_else(default_preset);
    if let Some(pattern) = args.pattern {
        preset.pattern = pattern;
    }
    if let Some(xpath) = args.xpath {
        preset.xpath = xpath;
    }
    if let Some(css) = args.css {
        preset.css = css;
    }
    if let Some(attr) = args.attr {
        preset.attr = attr;
    }

    let mut builder = Pipeline::builder()
        .timeout(Duration::from_secs(args.timeout))
        .strategy_kind(args.strategy)
        .preset(preset);
    if let Some(ua) = args.user_agent {
        builder = builder.user_agent(ua);
    }
    let pipeline = match builder.build() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let start = Instant::now();
    let result = if let Some(html_path) = &args.html {
        match fs::read(html_path) {
            Ok(bytes) => pipeline.extract_bytes(&bytes, args.content_type.as_deref()),
            Err(e) => {
                eprintln!("error reading file {:?}: {}", html_path, e);
                return ExitCode::from(1);
            }
        }
    } else {
        pipeline.run(&url).await
    };
    let elapsed = start.elapsed();

    let mut had_error = false;
    match result {
        Ok(headlines) => {
            let output_str = format_output(&headlines, args.json_output);
            if let Some(output_path) = &args.output {
                if let Err(e) = fs::write(output_path, &output_str) {
                    eprintln!("error writing to {:?}: {}", output_path, e);
                    had_error = true;
                }
            } else if !output_str.is_empty() {
                println!("{}", output_str);
            }
        }
        Err(e) => {
            eprintln!("{} error: {}", e.stage(), e);
            had_error = true;
        }
    }

    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }

    if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
