mod habit;
mod plan;

pub use habit::*;
pub use plan::*;

use anyhow::Result;
use serde::Serialize;

use crate::app::App;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);

    Ok(())
}

/// The signed-in user or a hint at how to configure one.
fn require_user(app: &App) -> Result<String> {
    app.identity
        .current_user_id()
        .ok_or_else(|| anyhow::anyhow!("no user configured, set user.id or CHRONOS_USER"))
}
