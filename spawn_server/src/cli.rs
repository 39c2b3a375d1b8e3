use std::{env, env::VarError};

/// The server has no command line options. Any argument at all prints the help text and the current configuration.
/// Returns `true` if the help was printed, in which case the caller should exit.
pub fn handle_command_line_args() -> bool {
    let wants_help = env::args().nth(1).is_some();
    if wants_help {
        println!("\n{}\n", include_str!("./cli-help.txt"));
        print_environment();
    }
    wants_help
}

fn print_environment() {
    // Secrets (PAYSTACK_SECRET_KEY, SPAWN_JWT_SECRET, SPAWN_EMAIL_API_KEY) are deliberately left off this list
    const DISPLAY_ENVS: [&str; 15] = [
        "RUST_LOG",
        "SPAWN_HOST",
        "SPAWN_PORT",
        "SPAWN_DATABASE_URL",
        "SPAWN_FRONTEND_URL",
        "SPAWN_ORDER_REDIRECT_PATH",
        "SPAWN_PAYMENT_VERIFY_TIMEOUT",
        "SPAWN_EVENT_BUFFER_SIZE",
        "SPAWN_PAYSTACK_BASE_URL",
        "SPAWN_PAYSTACK_CALLBACK_URL",
        "SPAWN_PAYSTACK_CURRENCY",
        "SPAWN_PAYSTACK_TIMEOUT",
        "SPAWN_EMAIL_API_URL",
        "SPAWN_EMAIL_FROM",
        "SPAWN_EMAIL_RETRIES",
    ];

    println!("Current environment (secrets are not shown):");
    for name in DISPLAY_ENVS {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    }
}
