//! Console styling and interactive prompts.

use colored::Colorize;
use std::io::{self, BufRead, Write};

const RULE: &str = "─────────────────────────────────────────";

pub fn banner() {
    println!(
        "\n {}  {}\n {}\n",
        "reqscan".cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).cyan(),
        "Pin the third-party packages your Python project imports".cyan()
    );
}

pub fn step(message: &str) {
    println!(" {} {}", "[*]".cyan(), message);
}

pub fn success(message: &str) {
    println!(" {} {}", "[+]".green(), message);
}

pub fn done(message: &str) {
    println!(" {} {}", "[✓]".green(), message);
}

pub fn info(message: &str) {
    println!(" {} {}", "[i]".yellow(), message);
}

pub fn error(message: &str) {
    println!(" {} {}", "[!]".red(), message);
}

pub fn rule() {
    println!(" {}", RULE.cyan());
}

/// Numbered menu entry
pub fn option(number: u8, label: &str) {
    println!("     {} {}", format!("{}.", number).bold(), label);
}

/// Read one trimmed line from stdin after printing `question`
pub fn ask(question: &str) -> io::Result<String> {
    print!("{}", question);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Ask for a 1-or-2 choice; anything other than "2" picks the first option
pub fn choose_second(question: &str) -> io::Result<bool> {
    Ok(ask(&format!("     {} [1]: ", question))? == "2")
}

/// Strip the quotes a shell drag-and-drop or copy-paste tends to add
pub fn unquote(raw: &str) -> String {
    raw.replace(['"', '\''], "")
}
