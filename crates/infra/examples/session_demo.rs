//! Example: Restoring or creating a session and calling an attendance route
//!
//! # Setup
//!
//! 1. Point the client at a backend: ```bash export
//!    ROLLCALL_API_BASE_URL=http://localhost:8080/api ```
//!
//! 2. Provide credentials for a fresh login: ```bash export
//!    ROLLCALL_DEMO_EMAIL=user@example.com ROLLCALL_DEMO_PASSWORD=secret ```
//!
//! 3. Run this example: ```bash cargo run -p rollcall-infra --example
//!    session_demo ```
//!
//! Tokens are written to the platform keychain, so a second run resumes the
//! session without logging in again.

use anyhow::Context;
use rollcall_infra::config;
use rollcall_infra::observability::init_tracing;
use rollcall_infra::SessionService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(false)?;

    let config = config::load().context("loading configuration")?;
    let service = SessionService::new(&config)?;

    let mut events = service.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::info!(?event, "session event");
        }
    });

    if service.bootstrap().await {
        println!("✓ Resumed persisted session");
    } else {
        let email = std::env::var("ROLLCALL_DEMO_EMAIL").context("ROLLCALL_DEMO_EMAIL not set")?;
        let password =
            std::env::var("ROLLCALL_DEMO_PASSWORD").context("ROLLCALL_DEMO_PASSWORD not set")?;

        service.try_login(&email, &password).await.context("login failed")?;
        println!("✓ Logged in as {email}");
    }

    let user = service.current_user().await?;
    println!("  User: {}", user.display_name());

    let attendance = service.attendance();
    println!("  Clocked in today:  {}", attendance.has_in_time_today().await?);
    println!("  Clocked out today: {}", attendance.has_out_time_today().await?);

    if std::env::args().any(|arg| arg == "--logout") {
        service.logout().await;
        println!("✓ Logged out");
    }

    Ok(())
}
