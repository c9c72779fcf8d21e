use std::{env, env::VarError};

/// The server takes no real command-line arguments. Any argument at all prints the help text and the current
/// (non-secret) environment, which is what an operator poking at a misbehaving deployment usually wants.
pub fn handle_command_line_args() -> bool {
    if env::args().count() <= 1 {
        return false;
    }
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
    display_envs();
    true
}

// Allowlist, never a denylist. A newly added secret envar must not show up here by default.
const DISPLAY_ENVS: [&str; 10] = [
    "RUST_LOG",
    "OFG_HOST",
    "OFG_PORT",
    "OFG_DATABASE_URL",
    "OFG_PAYMENT_HMAC_CHECKS",
    "OFG_PAYMENT_NOTIFICATION_URL",
    "OFG_AMOUNT_TOLERANCE_CENTS",
    "OFG_REVIEW_REQUEST_DELAY_HOURS",
    "OFG_USE_X_FORWARDED_FOR",
    "OFG_USE_FORWARDED",
];

fn display_envs() {
    println!("Current environment values (EXCLUDING variables that contain secrets):");
    for name in DISPLAY_ENVS {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    }
}
