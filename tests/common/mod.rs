use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests.
        // External-service env vars are stripped so the suite is deterministic
        // offline: auth answers 503 and no catalog workers start.
        let mut cmd = Command::new("target/debug/autointelli-api");
        cmd.env("PORT", port.to_string())
            .env_remove("SUPABASE_URL")
            .env_remove("SUPABASE_KEY")
            .env_remove("SECRET_KEY")
            .env_remove("NOTION_TOKEN_LOGISTICA")
            .env_remove("NOTION_DATABASE_ID_LOGISTICA")
            .env_remove("NOTION_TOKEN_PRODUCCION")
            .env_remove("NOTION_DATABASE_ID_PLANEACION")
            .env_remove("NOTION_TOKEN_DISENO")
            .env_remove("NOTION_DATABASE_ID_DISENO")
            .env_remove("NOTION_TOKEN_VENTAS")
            .env_remove("NOTION_DATABASE_ID_VENTAS")
            .env_remove("N8N_WEBHOOK_URL")
            .env_remove("LOGISTICA_WEBHOOK_URL")
            .env_remove("N8N_WEBHOOK_URL_DISENO")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
