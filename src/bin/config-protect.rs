use clap::{Parser, Subcommand};
use config_protected::{AesGcmProtector, Purpose, generate_key, seal_file, seal_file_in_place, unseal_file};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "config-protect")]
#[command(about = "A CLI tool for protecting secrets inside configuration files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generates a secure random master key
    GenKey,
    /// Rewrites Encrypt:{...} markers in a file into Protected:{...} tokens
    SealFile {
        /// Path to the configuration file
        #[arg(long)]
        path: PathBuf,

        /// Base58-encoded master key
        #[arg(long)]
        key: String,

        /// Optional output path. If not provided, seals in-place.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Explicit purpose string (defaults to the numbered-key convention)
        #[arg(long)]
        purpose: Option<String>,

        /// Key number for the numbered-key convention
        #[arg(long, default_value_t = 1)]
        key_number: u32,
    },
    /// Decrypts Protected:{...} tokens in a file back to plaintext
    UnsealFile {
        /// Path to the configuration file
        #[arg(long)]
        path: PathBuf,

        /// Base58-encoded master key
        #[arg(long)]
        key: String,

        /// Optional output path. If not provided, prints to stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Explicit purpose string (defaults to the numbered-key convention)
        #[arg(long)]
        purpose: Option<String>,

        /// Key number for the numbered-key convention
        #[arg(long, default_value_t = 1)]
        key_number: u32,
    },
    /// Encrypts a raw value and outputs the Protected:{...} token
    Protect {
        /// The raw value to encrypt
        #[arg(long)]
        value: String,

        /// Base58-encoded master key
        #[arg(long)]
        key: String,

        /// Optional token qualifier (selects a sub-purpose)
        #[arg(long)]
        qualifier: Option<String>,

        /// Explicit purpose string (defaults to the numbered-key convention)
        #[arg(long)]
        purpose: Option<String>,

        /// Key number for the numbered-key convention
        #[arg(long, default_value_t = 1)]
        key_number: u32,
    },
    /// Decrypts a single Protected:{...} token
    Unprotect {
        /// The token to decrypt
        #[arg(long)]
        value: String,

        /// Base58-encoded master key
        #[arg(long)]
        key: String,

        /// Explicit purpose string (defaults to the numbered-key convention)
        #[arg(long)]
        purpose: Option<String>,

        /// Key number for the numbered-key convention
        #[arg(long, default_value_t = 1)]
        key_number: u32,
    },
}

fn derive_purpose(purpose: Option<String>, key_number: u32) -> String {
    match purpose {
        Some(p) => Purpose::Named(p).derive(),
        None => Purpose::KeyNumber(key_number).derive(),
    }
}

fn protector_or_exit(key: &str) -> AesGcmProtector {
    match AesGcmProtector::new(key) {
        Ok(protector) => protector,
        Err(e) => {
            eprintln!("Error reading master key: {}", e);
            process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::GenKey => {
            let key = generate_key();
            println!("{}", key);
        }
        Commands::SealFile {
            path,
            key,
            output,
            purpose,
            key_number,
        } => {
            let protector = protector_or_exit(&key);
            let purpose = derive_purpose(purpose, key_number);
            let result = if let Some(out_path) = output {
                seal_file(&path, &out_path, &protector, &purpose)
            } else {
                seal_file_in_place(&path, &protector, &purpose)
            };

            if let Err(e) = result {
                eprintln!("Error sealing file: {}", e);
                process::exit(1);
            } else {
                eprintln!("File sealed successfully.");
            }
        }
        Commands::UnsealFile {
            path,
            key,
            output,
            purpose,
            key_number,
        } => {
            let protector = protector_or_exit(&key);
            let purpose = derive_purpose(purpose, key_number);
            match unseal_file(&path, &protector, &purpose) {
                Ok(content) => {
                    if let Some(out_path) = output {
                        if let Err(e) = std::fs::write(&out_path, content) {
                            eprintln!("Error writing output file: {}", e);
                            process::exit(1);
                        } else {
                            eprintln!("File unsealed successfully to {:?}", out_path);
                        }
                    } else {
                        print!("{}", content);
                    }
                }
                Err(e) => {
                    eprintln!("Error unsealing file: {}", e);
                    process::exit(1);
                }
            }
        }
        Commands::Protect {
            value,
            key,
            qualifier,
            purpose,
            key_number,
        } => {
            let protector = protector_or_exit(&key);
            let base = derive_purpose(purpose, key_number);
            let token = match qualifier {
                Some(q) => protector
                    .protect(&format!("{}.{}", base, q), &value)
                    .map(|payload| format!("Protected:{{{}}}:{{{}}}", q, payload)),
                None => protector
                    .protect(&base, &value)
                    .map(|payload| format!("Protected:{{{}}}", payload)),
            };
            match token {
                Ok(token) => println!("{}", token),
                Err(e) => {
                    eprintln!("Error protecting value: {}", e);
                    process::exit(1);
                }
            }
        }
        Commands::Unprotect {
            value,
            key,
            purpose,
            key_number,
        } => {
            let protector = protector_or_exit(&key);
            let purpose = derive_purpose(purpose, key_number);
            match config_protected::unseal_text(&value, &protector, &purpose) {
                Ok(plaintext) => println!("{}", plaintext),
                Err(e) => {
                    eprintln!("Error unprotecting value: {}", e);
                    process::exit(1);
                }
            }
        }
    }
}
