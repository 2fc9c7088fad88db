//! One-shot run from the command line: `analyze_urls [--prompt <text>] <url>...`
//! Prints the combined result as pretty JSON.

use anyhow::{bail, Context};
use webs_analyzer::config::AppConfig;
use webs_analyzer::AnalysisRequest;

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<AnalysisRequest> {
    let mut urls = Vec::new();
    let mut prompt = None;
    while let Some(a) = args.next() {
        match a.as_str() {
            "--prompt" | "-p" => {
                let Some(p) = args.next() else {
                    bail!("--prompt needs a value");
                };
                prompt = Some(p);
            }
            "--help" | "-h" => bail!("usage: analyze_urls [--prompt <text>] <url>..."),
            _ => urls.push(a),
        }
    }
    if urls.is_empty() {
        bail!("usage: analyze_urls [--prompt <text>] <url>...");
    }
    let mut req = AnalysisRequest::new(urls);
    req.prompt = prompt;
    Ok(req)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    webs_analyzer::init_tracing();

    let request = parse_args(std::env::args().skip(1))?;
    let cfg = AppConfig::load().context("loading configuration")?;
    let workflow = webs_analyzer::build_workflow(&cfg)?;

    let result = workflow.run(&request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
