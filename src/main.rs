use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Confirm, Select, Text};
use log::{info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use postia_studio::core::config::Config;
use postia_studio::core::io::NativeStorage;
use postia_studio::core::state::{ContentType, MediaFile, Platform, PostData, PostStatus, Tone};
use postia_studio::services::history::{HistoryQuery, HistorySummary, SortOrder};
use postia_studio::services::layout::LayoutConfig;
use postia_studio::services::notice::{Notice, NoticeLevel};
use postia_studio::services::preview::{Device, PreviewOptions};
use postia_studio::services::studio::{PublishKind, PublishOutcome, Studio};
use postia_studio::utils::timer::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Write,
    Platform,
    Tone,
    ContentType,
    AttachMedia,
    Preview,
    Layout,
    Publish,
    Schedule,
    SaveDraft,
    History,
    Delete,
    Quit,
}

impl Action {
    const ALL: [Action; 13] = [
        Action::Write,
        Action::Platform,
        Action::Tone,
        Action::ContentType,
        Action::AttachMedia,
        Action::Preview,
        Action::Layout,
        Action::Publish,
        Action::Schedule,
        Action::SaveDraft,
        Action::History,
        Action::Delete,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Write => "Write content",
            Action::Platform => "Choose platform",
            Action::Tone => "Choose tone",
            Action::ContentType => "Choose content type",
            Action::AttachMedia => "Attach media",
            Action::Preview => "Preview",
            Action::Layout => "Toggle panels",
            Action::Publish => "Publish now",
            Action::Schedule => "Schedule",
            Action::SaveDraft => "Save draft",
            Action::History => "Browse history",
            Action::Delete => "Delete a post",
            Action::Quit => "Quit",
        };
        f.write_str(label)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load_or_default()?;
    let storage = Arc::new(NativeStorage::new(config.storage.folder.clone()));
    let mut studio = Studio::with_mock_publisher(config, storage);
    studio.mount().await;

    loop {
        print_status(&studio);

        let action = Select::new("What next?", Action::ALL.to_vec()).prompt()?;
        let result = match action {
            Action::Write => write_content(&mut studio),
            Action::Platform => {
                let platform = Select::new("Platform:", Platform::ALL.to_vec()).prompt()?;
                studio.set_platform(platform);
                Ok(())
            }
            Action::Tone => {
                let tone = Select::new("Tone:", Tone::ALL.to_vec()).prompt()?;
                studio.set_tone(tone);
                Ok(())
            }
            Action::ContentType => {
                let content_type = Select::new("Content type:", ContentType::ALL.to_vec()).prompt()?;
                studio.set_content_type(content_type);
                Ok(())
            }
            Action::AttachMedia => attach_media(&mut studio),
            Action::Preview => show_preview(&studio),
            Action::Layout => toggle_layout(&mut studio),
            Action::Publish => run_publish(&mut studio, PublishKind::Now).await,
            Action::Schedule => {
                let date = Text::new("Schedule for (YYYY-MM-DDTHH:MM, UTC):")
                    .with_initial_value(&studio.state().schedule_date)
                    .prompt()?;
                studio.set_schedule_date(date);
                run_publish(&mut studio, PublishKind::Scheduled).await
            }
            Action::SaveDraft => studio.save_draft().await.map(|_| ()),
            Action::History => browse_history(&mut studio).await,
            Action::Delete => delete_post(&mut studio).await,
            Action::Quit => break,
        };

        if let Err(e) = result {
            warn!("{:#}", e);
            eprintln!("Error: {:#}", e);
        }
        print_notices(studio.take_notices());
    }

    studio.flush().await?;
    info!("Draft flushed, bye");
    Ok(())
}

fn print_status(studio: &Studio) {
    let state = studio.state();
    let status = studio.editor_status();
    println!();
    println!(
        "[{} | {} | {}] {} words, {}",
        state.platform, state.tone, state.content_type, status.stats.words, status.counter
    );
    if let Some(warning) = &status.warning {
        println!("  ! {}", warning);
    }
    if !state.selected_media.is_empty() {
        println!("  {} media attached", state.selected_media.len());
    }
}

fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warn",
            NoticeLevel::Error => "error",
        };
        println!("[{}] {}: {}", tag, notice.title, notice.message);
    }
}

fn write_content(studio: &mut Studio) -> Result<()> {
    let content = Text::new("Content:")
        .with_initial_value(&studio.state().content)
        .prompt()?;
    studio.set_content(content);
    Ok(())
}

fn attach_media(studio: &mut Studio) -> Result<()> {
    let path = Text::new("File path:").prompt()?;
    let path = std::fs::canonicalize(path.trim())?;
    let size = std::fs::metadata(&path)?.len();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let url = format!("file://{}", path.display());

    studio.attach_media(MediaFile::from_selection(&name, size, &url)?);
    Ok(())
}

fn show_preview(studio: &Studio) -> Result<()> {
    let device = Select::new("Device:", vec![Device::Mobile, Device::Tablet, Device::Desktop])
        .prompt()?;
    let options = PreviewOptions::for_device(device);
    let model = studio.preview(&options);

    println!("---- {} ({}px) ----", model.platform, model.frame_width);
    println!("{} {}", model.account_name, model.handle);
    println!("{}", model.body);
    if !model.hashtags.is_empty() {
        println!("{}", model.hashtags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" "));
    }
    for slot in &model.media {
        println!("[{:?}] {}", slot.kind, slot.url);
    }
    println!(
        "{} likes  {} comments  {} shares  | {}",
        model.engagement.likes,
        model.engagement.comments,
        model.engagement.shares,
        model.actions.join(" · ")
    );
    for issue in &model.issues {
        println!("  ! {}", issue);
    }
    Ok(())
}

fn toggle_layout(studio: &mut Studio) -> Result<()> {
    let options = vec![
        "Left panel",
        "Right panel",
        "Fullscreen preview",
        "Detached preview",
    ];
    match Select::new("Toggle:", options).prompt()? {
        "Left panel" => studio.toggle_left_panel(),
        "Right panel" => studio.toggle_right_panel(),
        "Fullscreen preview" => studio.toggle_preview_fullscreen(),
        _ => studio.toggle_preview_detached(),
    }

    let width = terminal_width();
    let widths = LayoutConfig::for_width(width).effective_widths(studio.state());
    println!(
        "Layout at {}px: sidebar {}% | editor {}% | preview {}%",
        width, widths.sidebar, widths.editor, widths.preview
    );
    Ok(())
}

/// Terminal columns mapped to a nominal pixel width.
fn terminal_width() -> u32 {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.parse::<u32>().ok())
        .map(|cols| cols * 8)
        .unwrap_or(1280)
}

async fn run_publish(studio: &mut Studio, kind: PublishKind) -> Result<()> {
    let request = match studio.begin_publish(kind) {
        Ok(request) => request,
        Err(_) => return Ok(()),
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(match kind {
        PublishKind::Now => "Publishing...",
        PublishKind::Scheduled => "Scheduling...",
    });
    pb.enable_steady_tick(Duration::from_millis(100));

    let publisher = studio.publisher();
    let history = studio.history();
    let result = Studio::deliver(publisher.as_ref(), &history, &request).await;
    pb.finish_and_clear();

    let outcome = studio.complete_publish(result);
    if let PublishOutcome::Published(_) | PublishOutcome::Scheduled(_) = outcome {
        print_notices(studio.take_notices());
        sleep(studio.config().publish.reset_delay()).await;
        studio.reset_editor().await?;
    }
    Ok(())
}

async fn browse_history(studio: &mut Studio) -> Result<()> {
    let posts = studio.history().load_all().await?;

    let search = Text::new("Search (empty for all):").prompt()?;
    let status = Select::new("Status:", filter_choices(PostStatus::ALL.iter().map(|s| s.as_str())))
        .prompt()?;
    let platform = Select::new("Platform:", filter_choices(Platform::ALL.iter().map(|p| p.as_str())))
        .prompt()?;
    let sort = Select::new(
        "Sort by:",
        vec![SortOrder::Newest, SortOrder::Oldest, SortOrder::Engagement, SortOrder::Platform],
    )
    .prompt()?;

    let query = HistoryQuery {
        search,
        status: status.parse().ok(),
        platform: platform.parse().ok(),
        sort,
    };
    let filtered = query.apply(&posts);

    let summary = HistorySummary::of(&filtered);
    println!(
        "{} posts ({} published, {} scheduled, {} drafts), {} interactions, reach {}",
        summary.total,
        summary.published,
        summary.scheduled,
        summary.drafts,
        summary.engagement,
        summary.reach
    );
    if filtered.is_empty() {
        return Ok(());
    }

    let choices: Vec<PostChoice> = filtered.into_iter().map(PostChoice).collect();
    let picked = Select::new("Open a post:", choices).prompt_skippable()?;
    if let Some(PostChoice(post)) = picked {
        if Confirm::new("Load it into the editor?").with_default(true).prompt()? {
            studio.edit_post(post);
        }
    }
    Ok(())
}

/// "all" followed by the given values; "all" parses to no filter.
fn filter_choices(values: impl Iterator<Item = &'static str>) -> Vec<&'static str> {
    std::iter::once("all").chain(values).collect()
}

async fn delete_post(studio: &mut Studio) -> Result<()> {
    let history = studio.history();
    let mut posts = history.published().await?;
    posts.extend(history.saved_drafts().await?);
    if posts.is_empty() {
        println!("Nothing stored yet.");
        return Ok(());
    }

    let choices: Vec<PostChoice> = posts.into_iter().map(PostChoice).collect();
    if let Some(PostChoice(post)) = Select::new("Delete which post?", choices).prompt_skippable()? {
        studio.delete_post(&post.id).await?;
    }
    Ok(())
}

struct PostChoice(PostData);

impl fmt::Display for PostChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let post = &self.0;
        let excerpt: String = post.content.chars().take(48).collect();
        let platforms = post
            .platform
            .iter()
            .map(|p| p.display_name())
            .collect::<Vec<_>>()
            .join(",");
        write!(
            f,
            "{} {:?} [{}] {}",
            post.created_at.format("%Y-%m-%d"),
            post.status,
            platforms,
            excerpt
        )
    }
}
