use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "studybook", bin_name = "studybook", version)]
#[command(about = "Mistake notebook and study notes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Skip confirmation prompts
    #[arg(short = 'y', long, global = true, help_heading = "Options")]
    pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Work with the notes tree
    #[command(subcommand, alias = "n", display_order = 1)]
    Note(NoteCommands),

    /// Work with the mistake notebook
    #[command(subcommand, alias = "m", display_order = 2)]
    Mistake(MistakeCommands),

    /// Manage subjects
    #[command(subcommand, alias = "s", display_order = 3)]
    Subject(SubjectCommands),

    /// Check and fix data inconsistencies
    #[command(display_order = 10)]
    Doctor,

    /// Get or set configuration
    #[command(display_order = 11)]
    Config {
        /// Configuration key (e.g. copy_suffix)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },

    /// Print the web app manifest as JSON
    #[command(display_order = 12)]
    Manifest,
}

#[derive(Subcommand, Debug)]
pub enum NoteCommands {
    /// Create a note or folder
    #[command(alias = "a", display_order = 1)]
    Add {
        /// Create a folder instead of a note
        #[arg(short, long)]
        folder: bool,

        /// Folder to create it in (display path, e.g. 1.2); top level if omitted
        #[arg(short, long)]
        parent: Option<String>,

        /// Markdown body
        #[arg(short, long, conflicts_with = "folder")]
        text: Option<String>,

        /// Tags (repeatable)
        #[arg(long = "tag", conflicts_with = "folder")]
        tags: Vec<String>,

        /// Title words (joined with spaces)
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        title: Vec<String>,
    },

    /// Show the tree, optionally filtered
    #[command(alias = "ls", display_order = 2)]
    List {
        /// Search term matched against titles, tags and text
        #[arg(short, long)]
        search: Option<String>,

        /// Only notes carrying this tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Show notes with their text and subtree
    #[command(alias = "v", display_order = 3)]
    View {
        /// Display paths (e.g. 1 1.2 2-3) or a title
        #[arg(required = true, num_args = 1..)]
        paths: Vec<String>,
    },

    /// Rename a note or folder
    #[command(display_order = 4)]
    Rename {
        path: String,

        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },

    /// Replace the text of a note
    #[command(display_order = 5)]
    Text {
        path: String,

        /// New Markdown body; omit together with --clear to remove it
        text: Option<String>,

        #[arg(long, conflicts_with = "text")]
        clear: bool,
    },

    /// Add or remove tags
    #[command(display_order = 6)]
    Tag {
        #[arg(required = true, num_args = 1..)]
        paths: Vec<String>,

        #[arg(long)]
        add: Vec<String>,

        #[arg(long)]
        remove: Vec<String>,
    },

    /// Attach an image to a note
    #[command(display_order = 7)]
    Attach {
        path: String,

        image: PathBuf,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Remove an attachment by its position
    #[command(display_order = 8)]
    Detach { path: String, position: usize },

    /// Move notes into a folder (top level if --to is omitted)
    #[command(alias = "mv", display_order = 9)]
    Move {
        #[arg(required = true, num_args = 1..)]
        paths: Vec<String>,

        #[arg(short, long)]
        to: Option<String>,
    },

    /// Drop one note onto another, as a drag and drop would
    #[command(display_order = 10)]
    Drop { active: String, over: String },

    /// Copy notes to the clipboard
    #[command(alias = "cp", display_order = 11)]
    Copy {
        #[arg(required = true, num_args = 1..)]
        paths: Vec<String>,
    },

    /// Cut notes to the clipboard
    #[command(display_order = 12)]
    Cut {
        #[arg(required = true, num_args = 1..)]
        paths: Vec<String>,
    },

    /// Paste the clipboard into a folder (top level if omitted)
    #[command(display_order = 13)]
    Paste { into: Option<String> },

    /// Delete notes with everything inside them
    #[command(alias = "rm", display_order = 14)]
    Delete {
        #[arg(required = true, num_args = 1..)]
        paths: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum MistakeCommands {
    /// Record a new mistake
    #[command(alias = "a", display_order = 1)]
    Add {
        #[arg(short, long, default_value = "")]
        title: String,

        /// Question image (repeatable, at least one)
        #[arg(short, long = "image", required = true)]
        images: Vec<PathBuf>,

        /// Image of the worked solution
        #[arg(long)]
        analysis_image: Option<PathBuf>,

        /// Written solution
        #[arg(short, long)]
        analysis: Option<String>,

        /// What went wrong
        #[arg(short, long, default_value = "")]
        reflection: String,

        /// Subject name; the default subject if omitted
        #[arg(short, long)]
        subject: Option<String>,
    },

    /// Edit a mistake; only the given fields change
    #[command(alias = "e", display_order = 2)]
    Edit {
        index: usize,

        #[arg(short, long)]
        title: Option<String>,

        /// Replace the question images
        #[arg(short, long = "image")]
        images: Vec<PathBuf>,

        #[arg(long)]
        analysis_image: Option<PathBuf>,

        #[arg(short, long)]
        analysis: Option<String>,

        #[arg(short, long)]
        reflection: Option<String>,

        #[arg(short, long)]
        subject: Option<String>,
    },

    /// List mistakes, newest first
    #[command(alias = "ls", display_order = 3)]
    List {
        #[arg(short, long)]
        subject: Option<String>,
    },

    /// Show mistakes in full, without logging a review
    #[command(display_order = 4)]
    Show {
        /// List positions (e.g. 1 3-5)
        #[arg(required = true, num_args = 1..)]
        indexes: Vec<String>,
    },

    /// Reveal the solution and log today's review
    #[command(display_order = 5)]
    Reveal { index: usize },

    /// Toggle the mastered flag
    #[command(display_order = 6)]
    Master { index: usize },

    /// Delete mistakes
    #[command(alias = "rm", display_order = 7)]
    Delete {
        #[arg(required = true, num_args = 1..)]
        indexes: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SubjectCommands {
    #[command(display_order = 1)]
    Add { name: String },

    #[command(alias = "ls", display_order = 2)]
    List,

    #[command(display_order = 3)]
    Rename { name: String, new_name: String },

    /// Delete a subject that has no mistakes
    #[command(alias = "rm", display_order = 4)]
    Delete { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_add_joins_title_words() {
        let cli = Cli::parse_from(["studybook", "note", "add", "-p", "1.2", "Chain", "rule"]);
        match cli.command {
            Some(Commands::Note(NoteCommands::Add { title, parent, folder, .. })) => {
                assert_eq!(title, vec!["Chain", "rule"]);
                assert_eq!(parent.as_deref(), Some("1.2"));
                assert!(!folder);
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn global_yes_after_subcommand() {
        let cli = Cli::parse_from(["studybook", "n", "rm", "2", "--yes"]);
        assert!(cli.yes);
        assert!(matches!(
            cli.command,
            Some(Commands::Note(NoteCommands::Delete { .. }))
        ));
    }

    #[test]
    fn mistake_add_requires_image() {
        assert!(Cli::try_parse_from(["studybook", "mistake", "add", "-t", "x"]).is_err());
        let cli =
            Cli::try_parse_from(["studybook", "m", "add", "-i", "q.png", "-i", "q2.png"]).unwrap();
        match cli.command {
            Some(Commands::Mistake(MistakeCommands::Add { images, .. })) => {
                assert_eq!(images.len(), 2)
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn folder_cannot_take_text() {
        assert!(
            Cli::try_parse_from(["studybook", "note", "add", "--folder", "-t", "x", "Box"]).is_err()
        );
    }
}
