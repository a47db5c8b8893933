//! System diagnostics

use crate::server::config::AppConfig;
use switchyard_llm::{MessagesApiClient, ModelBackend};

pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("🏥 Switchyard Doctor\n");

    let mut all_ok = true;

    all_ok &= check_data_dir(config).await;
    all_ok &= check_models(config);
    all_ok &= check_backend(config).await;

    println!();
    if all_ok {
        println!("✅ All checks passed! Ready to run Switchyard.");
        Ok(())
    } else {
        anyhow::bail!("some checks failed, see above")
    }
}

async fn check_data_dir(config: &AppConfig) -> bool {
    print!("Checking data directory... ");

    let data_dir = config.data_dir();
    if !data_dir.exists() {
        println!("ℹ️  Will create {}", data_dir.display());
        return true;
    }
    println!("✅ {}", data_dir.display());

    let session_path = config.session_path();
    if !session_path.exists() {
        println!("  ℹ️  Session file will be created on first run");
        return true;
    }

    match tokio::fs::read(&session_path).await {
        Ok(bytes) if serde_json::from_slice::<serde_json::Value>(&bytes).is_ok() => {
            println!("  ✅ Session file readable");
            true
        }
        Ok(_) => {
            println!("  ⚠️  Session file is corrupt; the backup will be used on startup");
            false
        }
        Err(e) => {
            println!("  ❌ Cannot read {}: {}", session_path.display(), e);
            false
        }
    }
}

fn check_models(config: &AppConfig) -> bool {
    print!("Checking tier models... ");

    let mismatches = config.llm.models.mismatches();
    if mismatches.is_empty() {
        println!("✅");
        return true;
    }

    println!("⚠️");
    for (tier, model, inferred) in mismatches {
        println!("  ⚠️  {} tier uses '{}', which looks like a {} model", tier, model, inferred);
    }
    false
}

async fn check_backend(config: &AppConfig) -> bool {
    print!("Checking model backend at {}... ", config.llm.base_url);

    let client = match MessagesApiClient::new(config.llm.backend_config()) {
        Ok(client) => client,
        Err(e) => {
            println!("❌ {}", e);
            return false;
        }
    };

    match client.health().await {
        Ok(()) => {
            println!("✅ Reachable");
            true
        }
        Err(e) => {
            println!("❌ {}", e);
            println!("  Start the proxy or set SWITCHYARD_LLM__BASE_URL");
            false
        }
    }
}
