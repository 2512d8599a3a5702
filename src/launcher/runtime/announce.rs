use console::style;

use crate::repo::Repo;

/// URL the UI is reachable at once the server is up.
pub fn ui_url(host: &str, port: u16) -> String {
    format!("http://{host}:{port}")
}

/// Lines printed right before the server starts.
pub fn build_announcement(repo: &Repo, host: &str, port: u16) -> Vec<String> {
    vec![
        style(format!("Running Aim UI on repo `{repo}`"))
            .yellow()
            .to_string(),
        format!("Open {}", ui_url(host, port)),
        "Press Ctrl+C to exit".to_string(),
    ]
}
