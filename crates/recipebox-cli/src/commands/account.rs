use anyhow::Result;
use colored::Colorize;
use recipebox_application::AppContext;
use recipebox_core::session::{Session, SessionState};

pub async fn sign_up(context: &AppContext, email: &str, password: &str) -> Result<()> {
    let session = context.session().sign_up(email, password).await?;
    println!("{} {}", "Welcome,".green(), session.display_name().bold());
    Ok(())
}

pub async fn sign_in(context: &AppContext, email: &str, password: &str) -> Result<()> {
    let session = context.session().sign_in(email, password).await?;
    println!("{} {}", "Signed in as".green(), session.display_name().bold());
    Ok(())
}

pub async fn sign_out(context: &AppContext) -> Result<()> {
    let session = context.session();
    // Restore the stored credential so the backend session ends too. Without
    // one, initializing would only mint a guest to throw away.
    if session.has_stored_credential().await {
        session.initialize().await?;
    }
    session.sign_out().await?;
    println!("{}", "Signed out.".green());
    Ok(())
}

pub async fn whoami(context: &AppContext) -> Result<()> {
    let state = context.session().initialize().await?;
    match state {
        SessionState::Active(session) => println!("{}", describe(&session)),
        SessionState::SignedOut | SessionState::Loading => println!("{}", "Not signed in.".dimmed()),
    }
    Ok(())
}

fn describe(session: &Session) -> String {
    let detail = if session.is_anonymous {
        format!("(guest {})", session.identity_id)
    } else {
        format!("({})", session.identity_id)
    };
    format!("{} {}", session.display_name().bold(), detail.dimmed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipebox_core::config::AppConfig;
    use recipebox_infrastructure::RecipeBoxPaths;
    use serde_json::Value;
    use tempfile::TempDir;

    fn registry(config: &AppConfig) -> Option<Value> {
        let path = RecipeBoxPaths::from_config(config).unwrap().accounts_file();
        let text = std::fs::read_to_string(path).ok()?;
        Some(serde_json::from_str(&text).unwrap())
    }

    #[tokio::test]
    async fn test_sign_out_without_credential_mints_no_guest() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig {
            data_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };

        for _ in 0..3 {
            let context = AppContext::file_backed(config.clone()).await.unwrap();
            sign_out(&context).await.unwrap();
        }

        if let Some(registry) = registry(&config) {
            assert_eq!(registry["anonymous"], Value::Array(Vec::new()));
        }
    }

    #[tokio::test]
    async fn test_sign_out_ends_stored_session() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig {
            data_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };

        let context = AppContext::file_backed(config.clone()).await.unwrap();
        sign_up(&context, "cook@example.com", "secret1").await.unwrap();
        drop(context);

        let context = AppContext::file_backed(config.clone()).await.unwrap();
        sign_out(&context).await.unwrap();

        let registry = registry(&config).unwrap();
        assert_eq!(registry["credentials"], Value::Object(Default::default()));
        assert!(!context.session().has_stored_credential().await);
    }
}
