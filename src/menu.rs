use std::io::{self, Write};

pub fn show_menu() -> io::Result<()> {
    println!("\n===========================================");
    println!("PID Academy");
    println!("===========================================");
    println!("Select an option:");
    println!("1. Threaded Simulation Demo");
    println!("2. Async Simulation Demo");
    println!("3. Compare Drivers (Threaded vs Async)");
    println!("4. Live Monitor");
    println!("5. Export Configuration Snapshot (JSON)");
    println!("6. Exit");
    println!("===========================================");
    print!("Choice (1-6): ");
    io::stdout().flush()
}

pub fn get_user_choice() -> io::Result<Option<u32>> {
    Ok(read_line()?.parse::<u32>().ok())
}

/// Prompts for a config path, falling back to `default` on empty input.
pub fn prompt_config(default: &str) -> io::Result<String> {
    print!("Config file [{default}]: ");
    io::stdout().flush()?;
    let input = read_line()?;
    Ok(if input.is_empty() {
        default.to_string()
    } else {
        input
    })
}

pub fn wait_for_enter() -> io::Result<()> {
    println!("\nPress Enter to return to menu...");
    read_line().map(drop)
}

fn read_line() -> io::Result<String> {
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
