//! Command handlers module.
//!
//! This module organizes the CLI command implementations into separate files:
//! - `tree.rs`: Tree creation and listing
//! - `person.rs`: People, relationships, events and media
//! - `graph.rs`: Layout and statistics
//! - `io.rs`: Export and import
//! - `config.rs`: Configuration display command

mod config;
mod graph;
mod io;
mod person;
mod tree;

use anyhow::{Context, bail};
use famgraph::GraphSession;
use famgraph::config::FamgraphConfig;
use famgraph::models::{Gender, PersonData, TreeId};
use famgraph::storage::FilesystemPersistence;

// Re-export command functions
pub use config::cmd_config;
pub use graph::{cmd_layout, cmd_stats};
pub use io::{cmd_export, cmd_import};
pub use person::{cmd_event, cmd_media, cmd_person, cmd_relate, cmd_unrelate};
pub use tree::cmd_tree;

/// Session over the filesystem store.
pub type Session = GraphSession<FilesystemPersistence>;

/// Tree subcommands.
#[derive(clap::Subcommand)]
pub enum TreeAction {
    /// Create a new, empty tree.
    Create {
        /// Tree name.
        name: String,

        /// Owner of the tree.
        #[arg(long, env = "FAMGRAPH_OWNER", default_value = "local")]
        owner: String,
    },

    /// List stored trees.
    List,
}

/// Person subcommands.
#[derive(clap::Subcommand)]
pub enum PersonAction {
    /// Add a person.
    Add {
        /// First name.
        first_name: String,

        /// Last name.
        #[arg(default_value = "")]
        last_name: String,

        #[command(flatten)]
        fields: PersonFields,
    },

    /// Update fields of a person.
    Update {
        /// Person ID.
        id: String,

        /// New first name.
        #[arg(long)]
        first_name: Option<String>,

        /// New last name.
        #[arg(long)]
        last_name: Option<String>,

        #[command(flatten)]
        fields: PersonFields,
    },

    /// Remove a person and everything attached to them.
    Remove {
        /// Person ID.
        id: String,
    },

    /// Show a person and their immediate family.
    Show {
        /// Person ID.
        id: String,

        /// Output format: table or json.
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

/// Optional person fields shared by `add` and `update`.
#[derive(clap::Args, Debug, Default)]
pub struct PersonFields {
    /// Middle name.
    #[arg(long)]
    middle_name: Option<String>,

    /// Maiden name.
    #[arg(long)]
    maiden_name: Option<String>,

    /// Gender: male, female, or other.
    #[arg(short, long)]
    gender: Option<String>,

    /// Birth date (YYYY-MM-DD).
    #[arg(long)]
    born: Option<String>,

    /// Birth place.
    #[arg(long)]
    birth_place: Option<String>,

    /// Death date (YYYY-MM-DD); marks the person deceased.
    #[arg(long)]
    died: Option<String>,

    /// Death place.
    #[arg(long)]
    death_place: Option<String>,

    /// Mark the person deceased without a date.
    #[arg(long)]
    deceased: bool,

    /// Biography text.
    #[arg(long)]
    bio: Option<String>,

    /// Photo URL.
    #[arg(long)]
    photo: Option<String>,
}

impl PersonFields {
    /// Applies the given fields over existing person data.
    pub fn apply(self, mut data: PersonData) -> anyhow::Result<PersonData> {
        if let Some(gender) = self.gender {
            data.gender = Gender::parse(&gender).with_context(|| {
                format!("unknown gender '{gender}' (expected male, female, or other)")
            })?;
        }
        if self.middle_name.is_some() {
            data.middle_name = self.middle_name;
        }
        if self.maiden_name.is_some() {
            data.maiden_name = self.maiden_name;
        }
        if self.born.is_some() {
            data.birth_date = self.born;
        }
        if self.birth_place.is_some() {
            data.birth_place = self.birth_place;
        }
        if self.died.is_some() || self.death_place.is_some() || self.deceased {
            data.is_living = false;
        }
        if self.died.is_some() {
            data.death_date = self.died;
        }
        if self.death_place.is_some() {
            data.death_place = self.death_place;
        }
        if self.bio.is_some() {
            data.biography = self.bio;
        }
        if self.photo.is_some() {
            data.photo_url = self.photo;
        }
        Ok(data)
    }
}

/// Event subcommands.
#[derive(clap::Subcommand)]
pub enum EventAction {
    /// Record an event.
    Add {
        /// Event title.
        title: String,

        /// Event type, e.g. birth, marriage, migration.
        #[arg(short = 'k', long = "type", default_value = "other")]
        event_type: String,

        /// Person the event belongs to.
        #[arg(short, long)]
        person: Option<String>,

        /// Event date.
        #[arg(short, long)]
        date: Option<String>,

        /// Description.
        #[arg(long)]
        description: Option<String>,

        /// Media item illustrating the event.
        #[arg(short, long)]
        media: Option<String>,
    },

    /// Remove an event.
    Remove {
        /// Event ID.
        id: String,
    },
}

/// Media subcommands.
#[derive(clap::Subcommand)]
pub enum MediaAction {
    /// Attach a media item.
    Add {
        /// Media URL.
        url: String,

        /// Media type: image, video, audio, or document.
        #[arg(short = 'k', long = "type", default_value = "image")]
        media_type: String,

        /// Person the media belongs to.
        #[arg(short, long)]
        person: Option<String>,

        /// Tags (repeatable).
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Remove a media item.
    Remove {
        /// Media ID.
        id: String,
    },
}

/// Opens a session and loads the selected tree.
///
/// Without an explicit tree id the only stored tree is used.
async fn open_session(config: &FamgraphConfig, tree: Option<&str>) -> anyhow::Result<Session> {
    let session = GraphSession::new(FilesystemPersistence::new(&config.data_dir));

    let tree_id = match tree {
        Some(id) => TreeId::new(id),
        None => {
            let trees = session.list_trees().await?;
            match trees.as_slice() {
                [only] => only.id.clone(),
                [] => bail!("no trees found; create one with `famgraph tree create <name>`"),
                _ => bail!(
                    "{} trees found; choose one with --tree <id> (see `famgraph tree list`)",
                    trees.len()
                ),
            }
        },
    };

    session
        .load(&tree_id)
        .await
        .with_context(|| format!("failed to load tree {tree_id}"))?;
    Ok(session)
}

/// Truncates a string for table display.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
