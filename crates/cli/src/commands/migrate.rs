//! `academaide migrate`: apply the PostgreSQL schema.

use academaide_config::AppConfig;
use academaide_store::PostgresStore;

use crate::runtime::{CliResult, StoreMode};

pub async fn run(config: AppConfig, mode: StoreMode) -> CliResult<()> {
    if mode.is_ephemeral() {
        return Err("migrate needs a database; drop --ephemeral/--fixture".into());
    }

    println!("Migrating {}", redact(&config.database.url));
    let store = PostgresStore::connect(&config.database.url, config.database.max_connections).await?;
    store.migrate().await?;
    println!("   Schema is up to date.");
    Ok(())
}

/// Hide the password in a connection URL.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme), Some(at)) if at > scheme => {
            let creds = &url[scheme + 3..at];
            match creds.split_once(':') {
                Some((user, _)) => format!("{}{user}:***{}", &url[..scheme + 3], &url[at..]),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::redact;

    #[test]
    fn password_is_hidden() {
        assert_eq!(
            redact("postgres://app:hunter2@db:5432/academ_aide"),
            "postgres://app:***@db:5432/academ_aide"
        );
    }

    #[test]
    fn urls_without_credentials_pass_through() {
        assert_eq!(redact("postgres://db/academ_aide"), "postgres://db/academ_aide");
        assert_eq!(redact("postgres://app@db/x"), "postgres://app@db/x");
    }
}
