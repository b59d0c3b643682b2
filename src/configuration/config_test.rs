use anyhow::Result;

use super::Config;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() {
    let res = Config::serialize_default(cli::build());
    let toml_res = res.parse::<toml_edit::Document>();

    assert!(toml_res.is_ok());
    assert!(res.contains("model ="));
    assert!(res.contains("writing-type ="));
    assert!(res.contains("instructions ="));
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches = cli::build().try_get_matches_from(vec!["redpen", "-c", "./config.example.toml"])?;
    Config::load(cli::build(), vec![&matches]).await?;
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_load_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["redpen", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(cli::build(), vec![&matches]).await;
    assert!(res.is_err());
    return Ok(());
}
