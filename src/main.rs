use anyhow::{bail, Context, Result};
use authverifier_lib::models::AnalysisResponse;
use authverifier_lib::services::{
    analyze_image, analyze_text, analyze_uploaded_image, AnalysisSettings, AppConfig, ConfigStore,
    SaplingClient, SerpApiClient, UploadedImage, SAPLING_PROVIDER, SERPAPI_PROVIDER,
};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

const USAGE: &str = "Usage:
  authverifier text <path|-> [--offline] [--out <json_path>]
  authverifier image <path> [--mime <type>] [--image-url <url>] [--consume] [--offline] [--out <json_path>]
  authverifier config path|show
  authverifier config set-key <sapling|serpapi> <key>
  authverifier config delete-key <sapling|serpapi>

Notes:
  - `--offline` skips the Sapling secondary engine and SerpAPI source search.
  - `--image-url` enables reverse image search for a publicly reachable copy of the image.
  - `--consume` deletes the image file once it has been analyzed.
  - API keys: SAPLING_API_KEY / SERPAPI_API_KEY, or `apiKeys` in the config file.
  - `config show` prints the config file with API keys masked.";

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

fn load_config() -> AppConfig {
    let Some(store) = ConfigStore::open_default() else {
        return AppConfig::default();
    };
    store.load().unwrap_or_else(|e| {
        warn!(error = %e, "config.load_failed; using defaults");
        AppConfig::default()
    })
}

fn known_provider(provider: &str) -> Result<&str> {
    match provider {
        SAPLING_PROVIDER | SERPAPI_PROVIDER => Ok(provider),
        other => bail!("unknown provider `{}` (expected sapling or serpapi)", other),
    }
}

fn mask_key(key: &str) -> String {
    let len = key.chars().count();
    if len <= 4 {
        return "****".to_string();
    }
    let tail: String = key.chars().skip(len - 4).collect();
    format!("****{}", tail)
}

/// Run a `config` subcommand against `store`, returning what to print.
fn run_config_command(store: &ConfigStore, args: &[String]) -> Result<String> {
    let action = args.first().map(String::as_str).unwrap_or("");
    match action {
        "path" => Ok(store.config_file().display().to_string()),
        "show" => {
            let mut config = store.load().map_err(anyhow::Error::msg)?;
            for key in config.api_keys.values_mut() {
                *key = mask_key(key);
            }
            Ok(serde_json::to_string_pretty(&config)?)
        }
        "set-key" => {
            let (Some(provider), Some(key)) = (args.get(1), args.get(2)) else {
                bail!("usage: authverifier config set-key <provider> <key>");
            };
            let provider = known_provider(provider)?;
            let key = key.trim();
            if key.is_empty() {
                bail!("API key must not be empty");
            }
            store.set_api_key(provider, key).map_err(anyhow::Error::msg)?;
            info!(provider, "config.key_saved");
            Ok(format!("Saved {} API key to {}", provider, store.config_file().display()))
        }
        "delete-key" => {
            let Some(provider) = args.get(1) else {
                bail!("usage: authverifier config delete-key <provider>");
            };
            let provider = known_provider(provider)?;
            store.delete_api_key(provider).map_err(anyhow::Error::msg)?;
            info!(provider, "config.key_deleted");
            Ok(format!("Deleted {} API key", provider))
        }
        other => bail!("unknown config action `{}`\n\n{}", other, USAGE),
    }
}

fn read_text_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read stdin failed")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("read file failed: {}", path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("{}", USAGE);
        return Ok(());
    }
    authverifier_lib::init_logging();

    if args[1] == "config" {
        let store = ConfigStore::open_default().context("no config directory on this platform")?;
        println!("{}", run_config_command(&store, &args[2..])?);
        return Ok(());
    }

    let mode = args[1].as_str();
    let path = args[2].clone();
    let out_path = parse_arg_value(&args, "--out");

    let config = load_config();
    let mut settings = AnalysisSettings::from(&config);
    if has_flag(&args, "--offline") {
        settings = settings.offline();
    }
    let search = SerpApiClient::from_config(&config);

    let response: AnalysisResponse = match mode {
        "text" => {
            let text = read_text_input(&path)?;
            let scorer = SaplingClient::from_config(&config);
            analyze_text(&text, &settings, &scorer, &search).await?
        }
        "image" => {
            let mime = parse_arg_value(&args, "--mime")
                .unwrap_or_else(|| guess_mime(Path::new(&path)).to_string());
            let image_url = parse_arg_value(&args, "--image-url");
            if has_flag(&args, "--consume") {
                let upload = UploadedImage::new(&path, mime);
                analyze_uploaded_image(upload, image_url.as_deref(), &settings, &search).await?
            } else {
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("read file failed: {}", path))?;
                analyze_image(&bytes, &mime, image_url.as_deref(), &settings, &search).await?
            }
        }
        other => bail!("unknown mode `{}`\n\n{}", other, USAGE),
    };

    let json = serde_json::to_string_pretty(&response)?;
    println!("{}", json);

    if let Some(out_path) = out_path {
        std::fs::write(&out_path, &json)
            .with_context(|| format!("write out failed: {}", out_path))?;
        eprintln!("Wrote JSON: {}", out_path);
    }

    Ok(())
}
