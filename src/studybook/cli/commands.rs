use super::print::{
    print_delete_preview, print_full_mistakes, print_full_nodes, print_messages, print_mistakes,
    print_subjects, print_tree,
};
use super::setup::{Cli, Commands, MistakeCommands, NoteCommands, SubjectCommands};
use clap::Parser;
use console::Term;
use std::path::PathBuf;
use studybook::api::{ConfigAction, NewNode, NodeEdit, NoteFilter, StudyApi};
use studybook::config::KEYS;
use studybook::error::{Result, StudyError};
use studybook::init::initialize;
use studybook::media::load_image;
use studybook::model::MistakeDraft;
use studybook::store::fs::FileStore;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Log filter for the binary, e.g. `STUDYBOOK_LOG=studybook=debug`.
const LOG_ENV: &str = "STUDYBOOK_LOG";

struct AppContext {
    api: StudyApi<FileStore>,
    yes: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = initialize()?;
    debug!(dir = %ctx.data_dir.display(), "opened data directory");
    let mut app = AppContext {
        api: ctx.api,
        yes: cli.yes,
    };

    let outcome = match cli.command {
        Some(Commands::Note(cmd)) => handle_note(&mut app, cmd),
        Some(Commands::Mistake(cmd)) => handle_mistake(&mut app, cmd),
        Some(Commands::Subject(cmd)) => handle_subject(&mut app, cmd),
        Some(Commands::Doctor) => handle_doctor(&mut app),
        Some(Commands::Config { key, value }) => handle_config(&mut app, key, value),
        Some(Commands::Manifest) => handle_manifest(&app),
        None => handle_note_list(&mut app, None, Vec::new()),
    };

    // The clipboard and selection survive a failed command too
    app.api.save_state()?;
    outcome
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("studybook=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Asks before a destructive step. Without a terminal the answer must come from `--yes`.
fn confirm(app: &AppContext, prompt: &str) -> Result<bool> {
    if app.yes {
        return Ok(true);
    }
    let term = Term::stdout();
    if !term.is_term() {
        return Err(StudyError::Api(
            "Not a terminal; pass --yes to confirm".to_string(),
        ));
    }
    term.write_str(&format!("{} [y/N] ", prompt))?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn handle_note(app: &mut AppContext, cmd: NoteCommands) -> Result<()> {
    match cmd {
        NoteCommands::Add {
            folder,
            parent,
            text,
            tags,
            title,
        } => {
            let kind = if folder {
                NewNode::Folder
            } else {
                NewNode::File { text, tags }
            };
            let result = app
                .api
                .create_note(title.join(" "), kind, parent.as_deref())?;
            print_messages(&result.messages);
            Ok(())
        }
        NoteCommands::List { search, tags } => handle_note_list(app, search, tags),
        NoteCommands::View { paths } => {
            let result = app.api.view_notes(&paths)?;
            print_full_nodes(&result.listed_nodes);
            print_messages(&result.messages);
            Ok(())
        }
        NoteCommands::Rename { path, title } => {
            edit_notes(app, &[path], vec![NodeEdit::Rename(title.join(" "))])
        }
        NoteCommands::Text { path, text, clear } => {
            if text.is_none() && !clear {
                return Err(StudyError::Api(
                    "Give the new text, or --clear to remove it".to_string(),
                ));
            }
            edit_notes(app, &[path], vec![NodeEdit::SetText(text)])
        }
        NoteCommands::Tag { paths, add, remove } => {
            let mut edits = Vec::new();
            if !add.is_empty() {
                edits.push(NodeEdit::AddTags(add));
            }
            if !remove.is_empty() {
                edits.push(NodeEdit::RemoveTags(remove));
            }
            edit_notes(app, &paths, edits)
        }
        NoteCommands::Attach {
            path,
            image,
            description,
        } => {
            let image_data = load_image(&image)?;
            edit_notes(
                app,
                &[path],
                vec![NodeEdit::Attach {
                    image_data,
                    description,
                }],
            )
        }
        NoteCommands::Detach { path, position } => {
            edit_notes(app, &[path], vec![NodeEdit::Detach(position)])
        }
        NoteCommands::Move { paths, to } => {
            let result = app.api.move_notes(&paths, to.as_deref())?;
            print_messages(&result.messages);
            print_tree(&result.affected_nodes);
            Ok(())
        }
        NoteCommands::Drop { active, over } => {
            let result = app.api.drop_note(&active, &over)?;
            print_messages(&result.messages);
            Ok(())
        }
        NoteCommands::Copy { paths } => {
            let result = app.api.copy_notes(&paths)?;
            print_messages(&result.messages);
            Ok(())
        }
        NoteCommands::Cut { paths } => {
            let result = app.api.cut_notes(&paths)?;
            print_messages(&result.messages);
            Ok(())
        }
        NoteCommands::Paste { into } => {
            let result = app.api.paste(into.as_deref())?;
            print_messages(&result.messages);
            print_tree(&result.affected_nodes);
            Ok(())
        }
        NoteCommands::Delete { paths } => {
            let preview = app.api.preview_delete_notes(&paths)?;
            if preview.targets.is_empty() {
                println!("Nothing to delete.");
                return Ok(());
            }
            println!("This deletes {} note(s):", preview.total());
            print_delete_preview(&preview);
            if !confirm(app, "Delete?")? {
                println!("Aborted.");
                return Ok(());
            }
            let result = app.api.delete_notes(&paths)?;
            print_messages(&result.messages);
            Ok(())
        }
    }
}

fn handle_note_list(app: &mut AppContext, search: Option<String>, tags: Vec<String>) -> Result<()> {
    let result = app.api.list_notes(NoteFilter {
        search_term: search,
        tags,
    })?;
    print_tree(&result.listed_nodes);
    print_messages(&result.messages);
    Ok(())
}

fn edit_notes(app: &mut AppContext, paths: &[String], edits: Vec<NodeEdit>) -> Result<()> {
    let result = app.api.update_notes(paths, &edits)?;
    print_messages(&result.messages);
    Ok(())
}

fn load_images(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths.iter().map(|p| load_image(p)).collect()
}

fn handle_mistake(app: &mut AppContext, cmd: MistakeCommands) -> Result<()> {
    match cmd {
        MistakeCommands::Add {
            title,
            images,
            analysis_image,
            analysis,
            reflection,
            subject,
        } => {
            let subject_id = match subject {
                Some(name) => Some(app.api.subject_id(&name)?),
                None => {
                    let default = app.api.settings().default_subject.clone();
                    app.api.subject_id(&default).ok()
                }
            };
            let draft = MistakeDraft {
                title,
                question_images: load_images(&images)?,
                analysis_image: analysis_image.as_deref().map(load_image).transpose()?,
                analysis_text: analysis,
                reflection,
                subject_id,
            };
            let result = app.api.add_mistake(&draft)?;
            print_messages(&result.messages);
            Ok(())
        }
        MistakeCommands::Edit {
            index,
            title,
            images,
            analysis_image,
            analysis,
            reflection,
            subject,
        } => {
            let mut draft = app.api.mistake_draft(index)?;
            if let Some(title) = title {
                draft.title = title;
            }
            if !images.is_empty() {
                draft.question_images = load_images(&images)?;
            }
            if let Some(path) = analysis_image {
                draft.analysis_image = Some(load_image(&path)?);
            }
            if let Some(text) = analysis {
                draft.analysis_text = Some(text);
            }
            if let Some(reflection) = reflection {
                draft.reflection = reflection;
            }
            if let Some(name) = subject {
                draft.subject_id = Some(app.api.subject_id(&name)?);
            }
            let result = app.api.edit_mistake(index, &draft)?;
            print_messages(&result.messages);
            Ok(())
        }
        MistakeCommands::List { subject } => {
            let result = app.api.list_mistakes(subject.as_deref())?;
            print_mistakes(&result.mistakes);
            print_messages(&result.messages);
            Ok(())
        }
        MistakeCommands::Show { indexes } => {
            let result = app.api.show_mistakes(&indexes)?;
            print_full_mistakes(&result.mistakes, false);
            Ok(())
        }
        MistakeCommands::Reveal { index } => {
            let result = app.api.reveal_mistake(index)?;
            print_full_mistakes(&result.mistakes, true);
            print_messages(&result.messages);
            Ok(())
        }
        MistakeCommands::Master { index } => {
            let result = app.api.toggle_mastered(index)?;
            print_messages(&result.messages);
            Ok(())
        }
        MistakeCommands::Delete { indexes } => {
            let targets = app.api.preview_delete_mistakes(&indexes)?;
            println!("This deletes {} mistake(s):", targets.len());
            for (index, mistake) in &targets {
                println!("  {}. {}", index, mistake.display_title());
            }
            if !confirm(app, "Delete?")? {
                println!("Aborted.");
                return Ok(());
            }
            let result = app.api.delete_mistakes(&indexes)?;
            print_messages(&result.messages);
            Ok(())
        }
    }
}

fn handle_subject(app: &mut AppContext, cmd: SubjectCommands) -> Result<()> {
    let result = match cmd {
        SubjectCommands::Add { name } => app.api.add_subject(&name)?,
        SubjectCommands::List => {
            let result = app.api.list_subjects()?;
            print_subjects(&result.subjects);
            result
        }
        SubjectCommands::Rename { name, new_name } => app.api.rename_subject(&name, &new_name)?,
        SubjectCommands::Delete { name } => {
            if !confirm(app, &format!("Delete subject {}?", name))? {
                println!("Aborted.");
                return Ok(());
            }
            app.api.delete_subject(&name)?
        }
    };
    print_messages(&result.messages);
    Ok(())
}

fn handle_doctor(app: &mut AppContext) -> Result<()> {
    let result = app.api.doctor()?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_config(app: &mut AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let show_all = key.is_none();
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };

    let result = app.api.config(action)?;
    if show_all {
        if let Some(config) = &result.config {
            for key in KEYS {
                let value = config.get(key).unwrap_or_default();
                println!("{} = {}", key, value);
            }
        }
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_manifest(app: &AppContext) -> Result<()> {
    println!("{}", app.api.manifest().to_json()?);
    Ok(())
}
