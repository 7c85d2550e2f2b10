//! Lockleaf CLI - command line consumer of the vault storage engine.
//!
//! This tool wires the auth gateway, the vault catalog and the
//! collection store together the way a presentation layer would, without
//! any storage logic of its own.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use url::Url;
use uuid::Uuid;

use lockleaf_auth::{AuthGateway, KeyringStore, UnsupportedBiometrics};
use lockleaf_crypto::CipherEngine;
use lockleaf_store::{CollectionStore, Folder, Link, Note};
use lockleaf_vault::{Vault, VaultCatalog};

#[derive(Parser)]
#[command(name = "lockleaf")]
#[command(about = "Lockleaf - encrypted notes, links and folders")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up (or replace) the vault password.
    Setup {
        /// Escrow the session key for biometric unlock.
        #[arg(long)]
        escrow: bool,
    },

    /// Show credential and vault status.
    Status,

    /// Check the password, or unlock via biometrics.
    Unlock {
        /// Use the platform biometric check instead of the password.
        #[arg(long)]
        biometric: bool,
    },

    /// Manage vaults.
    Vault {
        #[command(subcommand)]
        command: VaultCommands,
    },

    /// Manage notes.
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },

    /// Manage links.
    Link {
        #[command(subcommand)]
        command: LinkCommands,
    },

    /// Manage folders.
    Folder {
        #[command(subcommand)]
        command: FolderCommands,
    },
}

#[derive(Subcommand)]
enum VaultCommands {
    /// Create a new vault directory and register it.
    Create {
        /// Vault name.
        #[arg(short, long)]
        name: String,

        /// Directory to hold the vault.
        #[arg(short, long)]
        path: PathBuf,
    },

    /// List registered vaults.
    List,

    /// Select a vault as the working vault.
    Use {
        /// Name of a registered vault.
        name: String,
    },

    /// Remove a vault from the registry (its directory is kept).
    Remove {
        /// Name of a registered vault.
        name: String,
    },
}

#[derive(Subcommand)]
enum NoteCommands {
    /// Add or update a note.
    Add {
        title: String,

        /// Note body.
        #[arg(short, long, default_value = "")]
        content: String,

        /// Folder to file the note under.
        #[arg(short, long)]
        folder: Option<Uuid>,
    },

    /// List notes in the working vault.
    List,

    /// Delete a note by id.
    Remove { id: Uuid },
}

#[derive(Subcommand)]
enum LinkCommands {
    /// Add a link.
    Add {
        title: String,
        url: Url,

        #[arg(short, long)]
        description: Option<String>,

        /// Folder to file the link under.
        #[arg(short, long)]
        folder: Option<Uuid>,
    },

    /// List links in the working vault.
    List,

    /// Delete a link by id.
    Remove { id: Uuid },
}

#[derive(Subcommand)]
enum FolderCommands {
    /// Add a folder.
    Add { name: String },

    /// List folders in the working vault.
    List,

    /// Delete a folder, unfiling its notes and links.
    Remove { id: Uuid },
}

/// The wired-up core services backing every command.
struct Services {
    cipher: Arc<CipherEngine>,
    gateway: AuthGateway,
    catalog: VaultCatalog,
    store: CollectionStore,
}

fn build_services() -> Services {
    let cipher = Arc::new(CipherEngine::new());
    let gateway = AuthGateway::new(
        Arc::new(KeyringStore::new()),
        Arc::new(UnsupportedBiometrics),
        cipher.clone(),
    );
    let catalog = VaultCatalog::open_default();

    // The working vault is the most recently opened one; without any,
    // the store falls back to its default directory.
    let store = match working_vault(&catalog) {
        Some(vault) => CollectionStore::with_vault_dir(cipher.clone(), &vault.path),
        None => CollectionStore::new(cipher.clone()),
    };

    Services {
        cipher,
        gateway,
        catalog,
        store,
    }
}

fn working_vault(catalog: &VaultCatalog) -> Option<&Vault> {
    catalog
        .list_vaults()
        .iter()
        .filter(|v| v.last_opened.is_some())
        .max_by_key(|v| v.last_opened)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut services = build_services();

    match cli.command {
        Commands::Setup { escrow } => cmd_setup(&services, escrow),
        Commands::Status => cmd_status(&services),
        Commands::Unlock { biometric } => cmd_unlock(&services, biometric).await,
        Commands::Vault { command } => cmd_vault(&mut services, command),
        Commands::Note { command } => cmd_note(&services, command),
        Commands::Link { command } => cmd_link(&services, command),
        Commands::Folder { command } => cmd_folder(&services, command),
    }
}

/// Prompt for a password without echoing it.
fn prompt_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("Failed to read password")
}

/// Check the password and install the session key, or fail the command.
fn unlock_with_password(services: &Services) -> Result<()> {
    if !services.gateway.has_credential() {
        bail!("No password configured; run `lockleaf setup` first");
    }
    let password = prompt_password("Enter password: ")?;
    if !services.gateway.verify_credential(&password) {
        bail!("Wrong password");
    }
    Ok(())
}

fn cmd_setup(services: &Services, escrow: bool) -> Result<()> {
    let password = prompt_password("New password: ")?;
    let confirm = prompt_password("Confirm password: ")?;

    if password != confirm {
        bail!("Passwords do not match");
    }
    if !services.gateway.setup_credential(&password, escrow) {
        bail!("Password setup failed");
    }

    println!("Password configured.");
    if escrow {
        println!("Session key escrowed for biometric unlock.");
    }
    Ok(())
}

fn cmd_status(services: &Services) -> Result<()> {
    println!("Credential configured: {}", services.gateway.has_credential());
    println!(
        "Biometric unlock:      {}",
        if services.gateway.biometric_available() {
            "available"
        } else {
            "unavailable"
        }
    );

    match working_vault(&services.catalog) {
        Some(vault) => println!(
            "Working vault:         {} ({})",
            vault.name,
            vault.path.display()
        ),
        None => println!("Working vault:         none (default directory)"),
    }
    println!("Registered vaults:     {}", services.catalog.list_vaults().len());
    Ok(())
}

async fn cmd_unlock(services: &Services, biometric: bool) -> Result<()> {
    if biometric {
        if !services.gateway.biometric_available() {
            bail!("Biometric unlock is not available (no platform support or no escrowed key)");
        }
        if !services.gateway.authenticate_biometric().await {
            bail!("Biometric unlock failed");
        }
    } else {
        unlock_with_password(services)?;
    }

    println!("Unlocked.");
    Ok(())
}

fn cmd_vault(services: &mut Services, command: VaultCommands) -> Result<()> {
    match command {
        VaultCommands::Create { name, path } => {
            unlock_with_password(services)?;

            let vault =
                services
                    .catalog
                    .create_vault(&name, &path, true, services.cipher.clone());

            if services.catalog.list_vaults().iter().any(|v| v.id == vault.id) {
                services.catalog.set_current_vault(&vault);
                println!("Vault created: {} ({})", vault.name, vault.path.display());
            } else {
                bail!("Vault directory could not be created: {}", path.display());
            }
        }

        VaultCommands::List => {
            if services.catalog.list_vaults().is_empty() {
                println!("No vaults registered.");
            }
            for vault in services.catalog.list_vaults() {
                let opened = vault
                    .last_opened
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{}  {}  ({}, last opened {})",
                    vault.id,
                    vault.name,
                    vault.path.display(),
                    opened
                );
            }
        }

        VaultCommands::Use { name } => {
            let vault = services
                .catalog
                .list_vaults()
                .iter()
                .find(|v| v.name == name)
                .cloned()
                .with_context(|| format!("No vault named '{name}'"))?;

            services.catalog.set_current_vault(&vault);
            services.store.set_vault_dir(Some(vault.path.clone()));
            println!("Now using vault: {}", vault.name);
        }

        VaultCommands::Remove { name } => {
            let vault = services
                .catalog
                .list_vaults()
                .iter()
                .find(|v| v.name == name)
                .cloned()
                .with_context(|| format!("No vault named '{name}'"))?;

            services.catalog.remove_vault(vault.id);
            println!("Vault removed from registry: {}", vault.name);
        }
    }
    Ok(())
}

fn cmd_note(services: &Services, command: NoteCommands) -> Result<()> {
    unlock_with_password(services)?;

    match command {
        NoteCommands::Add {
            title,
            content,
            folder,
        } => {
            let mut note = Note::new(title, content);
            note.folder_id = folder;
            let id = note.id;
            services.store.save_note(note);
            println!("Note saved: {id}");
        }

        NoteCommands::List => {
            let notes = services.store.load_notes();
            if notes.is_empty() {
                println!("No notes.");
            }
            for note in notes {
                println!(
                    "{}  {}  (modified {})",
                    note.id,
                    note.title,
                    note.modification_date.format("%Y-%m-%d %H:%M")
                );
            }
        }

        NoteCommands::Remove { id } => {
            services.store.delete_note(id);
            println!("Note deleted: {id}");
        }
    }
    Ok(())
}

fn cmd_link(services: &Services, command: LinkCommands) -> Result<()> {
    unlock_with_password(services)?;

    match command {
        LinkCommands::Add {
            title,
            url,
            description,
            folder,
        } => {
            let mut link = Link::new(title, url);
            link.description = description;
            link.folder_id = folder;
            let id = link.id;
            services.store.save_link(link);
            println!("Link saved: {id}");
        }

        LinkCommands::List => {
            let links = services.store.load_links();
            if links.is_empty() {
                println!("No links.");
            }
            for link in links {
                println!("{}  {}  ({})", link.id, link.title, link.url);
            }
        }

        LinkCommands::Remove { id } => {
            services.store.delete_link(id);
            println!("Link deleted: {id}");
        }
    }
    Ok(())
}

fn cmd_folder(services: &Services, command: FolderCommands) -> Result<()> {
    unlock_with_password(services)?;

    match command {
        FolderCommands::Add { name } => {
            let folder = Folder::new(name);
            let id = folder.id;
            services.store.save_folder(folder);
            println!("Folder created: {id}");
        }

        FolderCommands::List => {
            let folders = services.store.load_folders();
            if folders.is_empty() {
                println!("No folders.");
            }
            for folder in folders {
                println!("{}  {}", folder.id, folder.name);
            }
        }

        FolderCommands::Remove { id } => {
            services.store.delete_folder(id);
            println!("Folder deleted: {id} (its notes and links were unfiled)");
        }
    }
    Ok(())
}
