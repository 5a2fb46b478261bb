//! `helperbot config`: print the default configuration.

use helperbot_config::AppConfig;

pub fn print_default() {
    println!("# helperbot configuration");
    println!("# Secrets are read from the environment (or .env):");
    println!("#   OPENROUTER_API_KEY, REDDIT_CLIENT_ID, REDDIT_CLIENT_SECRET,");
    println!("#   REDDIT_USERNAME, REDDIT_PASSWORD, USER_AGENT, SEARXNG_BASE_URL");
    println!();
    print!("{}", AppConfig::default_toml());
}

#[cfg(test)]
mod tests {
    use helperbot_config::AppConfig;
    use std::io::Write;

    #[test]
    fn default_toml_loads_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(AppConfig::default_toml().as_bytes()).unwrap();
        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.bot.subreddits, vec!["all".to_string()]);
        assert_eq!(config.transcript.max_images, 5);
    }
}
