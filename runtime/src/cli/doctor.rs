//! Environment readiness check.

use crate::cli::output;
use crate::config::RunConfig;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use serde_json::json;

/// Check Chromium availability and the run configuration.
pub async fn run() -> Result<()> {
    let config = RunConfig::from_env();
    let explicit = config
        .as_ref()
        .ok()
        .and_then(|c| c.browser.chromium_path.clone());
    let chromium_path = find_chromium(explicit.as_deref());
    let ready = chromium_path.is_some() && config.is_ok();

    if output::is_json() {
        let chromium = chromium_path.as_ref().map(|p| p.display().to_string());
        let config_error = config.as_ref().err().map(|e| e.to_string());
        let auth = config.as_ref().ok().map(|c| c.auth.name());
        let text = config
            .as_ref()
            .ok()
            .map(|c| if c.llm.is_some() { "generated" } else { "template" });
        output::print_json(&json!({
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "chromium": chromium,
            "config_ok": config.is_ok(),
            "config_error": config_error,
            "auth": auth,
            "text": text,
            "ready": ready,
        }));
        return Ok(());
    }

    println!("Reciprocity Doctor");
    println!("==================");
    println!();
    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    match &chromium_path {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!("[!!] Chromium NOT found. Set GROWTH_CHROMIUM_PATH or install google-chrome."),
    }

    match &config {
        Ok(config) => {
            println!("[OK] Configuration valid");
            println!("     auth:    {}", config.auth.name());
            println!("     keyword: {}", config.keyword);
            println!(
                "     pacing:  {}-{}s",
                config.pacing.min_secs, config.pacing.max_secs
            );
            match &config.llm {
                Some(llm) => println!("     text:    generated ({})", llm.model),
                None => println!("     text:    template (OPENAI_API_KEY not set)"),
            }
        }
        Err(e) => println!("[!!] {e}"),
    }

    println!();
    if ready {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }
    Ok(())
}
