use leptos::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::core::config::Config;
use crate::core::io::{Storage, WebStorage};
use crate::core::state::{ContentType, MediaFile, Platform, PostData, PostStatus, StudioState, Tone};
use crate::services::editor::EditorStatus;
use crate::services::history::{HistoryQuery, HistorySummary, PostHistory, SortOrder};
use crate::services::layout::LayoutConfig;
use crate::services::notice::{Notice, NoticeLevel};
use crate::services::preview::{self, Device, PreviewInput, PreviewOptions};
use crate::services::studio::{PendingState, PublishKind, Studio};
use crate::utils::timer::sleep;

#[component]
pub fn App() -> impl IntoView {
    let storage = WebStorage::new()
        .map(|s| Arc::new(s) as Arc<dyn Storage>)
        .map_err(|e| e.to_string());

    view! {
        <div class="app-container">
            <h1>"PostIA.mg"</h1>
            {match storage {
                Ok(s) => view! { <StudioShell storage=s/> }.into_view(),
                Err(e) => view! { <p>"Error loading storage: " {e}</p> }.into_view(),
            }}
        </div>
    }
}

/// Shared access to the studio from event handlers.
///
/// The store's subscriber only queues the new state. Signals are written in
/// [`StudioHandle::sync`] once the `RefCell` borrow is released, since views
/// re-rendering in response may read the store again.
#[derive(Clone)]
struct StudioHandle {
    studio: Rc<RefCell<Studio>>,
    pending: PendingState,
    set_state: WriteSignal<StudioState>,
    set_notices: WriteSignal<Vec<Notice>>,
    history_changed: RwSignal<u64>,
}

impl StudioHandle {
    fn new(
        mut studio: Studio,
        set_state: WriteSignal<StudioState>,
        set_notices: WriteSignal<Vec<Notice>>,
    ) -> Self {
        let pending = studio.subscribe_deferred();

        Self {
            studio: Rc::new(RefCell::new(studio)),
            pending,
            set_state,
            set_notices,
            history_changed: create_rw_signal(0),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut Studio) -> R) -> R {
        let out = f(&mut self.studio.borrow_mut());
        self.sync();
        out
    }

    fn sync(&self) {
        let notices = self.studio.borrow_mut().take_notices();
        if let Some(state) = self.pending.take() {
            self.set_state.set(state);
        }
        if !notices.is_empty() {
            self.set_notices.update(|all| all.extend(notices));
        }
    }

    fn history(&self) -> PostHistory {
        self.studio.borrow().history()
    }

    fn bump_history(&self) {
        self.history_changed.update(|n| *n += 1);
    }

    fn publish(&self, kind: PublishKind) {
        let Ok(request) = self.update(|s| s.begin_publish(kind)) else {
            return;
        };
        let (publisher, history, reset_delay) = {
            let s = self.studio.borrow();
            (s.publisher(), s.history(), s.config().publish.reset_delay())
        };

        let handle = self.clone();
        spawn_local(async move {
            let result = Studio::deliver(publisher.as_ref(), &history, &request).await;
            let succeeded = handle.update(|s| s.complete_publish(result)).post().is_some();
            if !succeeded {
                return;
            }
            handle.bump_history();

            sleep(reset_delay).await;
            // localStorage calls complete without yielding, so this borrow
            // never spans a suspension point.
            let reset = handle.studio.borrow_mut().reset_editor().await;
            handle.sync();
            if let Err(e) = reset {
                log::error!("Failed to reset editor: {:#}", e);
            }
        });
    }
}

fn viewport_width() -> u32 {
    web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|w| w.as_f64())
        .map(|w| w as u32)
        .unwrap_or(1280)
}

fn picked_media(input: &web_sys::HtmlInputElement) -> Vec<MediaFile> {
    let Some(files) = input.files() else {
        return Vec::new();
    };
    (0..files.length())
        .filter_map(|i| files.get(i))
        .filter_map(|file| {
            let url = web_sys::Url::create_object_url_with_blob(&file).ok()?;
            match MediaFile::from_selection(&file.name(), file.size() as u64, &url) {
                Ok(media) => Some(media),
                Err(e) => {
                    log::warn!("Skipping {}: {:#}", file.name(), e);
                    None
                }
            }
        })
        .collect()
}

#[component]
pub fn StudioShell(storage: Arc<dyn Storage>) -> impl IntoView {
    let studio = Studio::with_mock_publisher(Config::default(), storage);
    let (state, set_state) = create_signal(studio.state().clone());
    let (notices, set_notices) = create_signal(Vec::<Notice>::new());
    let handle = StudioHandle::new(studio, set_state, set_notices);

    {
        let handle = handle.clone();
        spawn_local(async move {
            handle.studio.borrow_mut().mount().await;
            handle.sync();
        });
    }

    let publish_now = {
        let handle = handle.clone();
        move |_| handle.publish(PublishKind::Now)
    };
    let schedule = {
        let handle = handle.clone();
        move |_| handle.publish(PublishKind::Scheduled)
    };
    let save_draft = {
        let handle = handle.clone();
        move |_| {
            let handle = handle.clone();
            spawn_local(async move {
                let saved = handle.studio.borrow_mut().save_draft().await;
                handle.sync();
                match saved {
                    Ok(Some(_)) => handle.bump_history(),
                    Ok(None) => {}
                    Err(e) => log::error!("Failed to save draft: {:#}", e),
                }
            });
        }
    };

    let on_input = {
        let handle = handle.clone();
        move |ev| {
            let content = event_target_value(&ev);
            handle.update(|s| s.set_content(content));
        }
    };
    let on_platform = {
        let handle = handle.clone();
        move |ev| {
            if let Ok(platform) = event_target_value(&ev).parse::<Platform>() {
                handle.update(|s| s.set_platform(platform));
            }
        }
    };
    let on_tone = {
        let handle = handle.clone();
        move |ev| {
            if let Some(tone) = event_target_value(&ev)
                .parse::<usize>()
                .ok()
                .and_then(|i| Tone::ALL.get(i).copied())
            {
                handle.update(|s| s.set_tone(tone));
            }
        }
    };
    let on_content_type = {
        let handle = handle.clone();
        move |ev| {
            if let Some(content_type) = event_target_value(&ev)
                .parse::<usize>()
                .ok()
                .and_then(|i| ContentType::ALL.get(i).copied())
            {
                handle.update(|s| s.set_content_type(content_type));
            }
        }
    };
    let on_schedule_date = {
        let handle = handle.clone();
        move |ev| {
            let date = event_target_value(&ev);
            handle.update(|s| s.set_schedule_date(date));
        }
    };
    let on_files = {
        let handle = handle.clone();
        move |ev| {
            let input = event_target::<web_sys::HtmlInputElement>(&ev);
            for media in picked_media(&input) {
                handle.update(|s| s.attach_media(media));
            }
            input.set_value("");
        }
    };
    let toggle_left = {
        let handle = handle.clone();
        move |_| handle.update(|s| s.toggle_left_panel())
    };
    let toggle_right = {
        let handle = handle.clone();
        move |_| handle.update(|s| s.toggle_right_panel())
    };
    let toggle_fullscreen = {
        let handle = handle.clone();
        move |_| handle.update(|s| s.toggle_preview_fullscreen())
    };
    let toggle_detached = {
        let handle = handle.clone();
        move |_| handle.update(|s| s.toggle_preview_detached())
    };

    let status = move || EditorStatus::evaluate(&state.get());
    let widths = move || LayoutConfig::for_width(viewport_width()).effective_widths(&state.get());
    let history = handle.history();
    let media_handle = handle.clone();

    view! {
        <div class="studio">
            <header class="toolbar">
                <button on:click=toggle_left>"☰"</button>
                <select on:change=on_platform>
                    {Platform::ALL.into_iter().map(|p| view! {
                        <option value=p.as_str() selected=move || state.get().platform == p>
                            {p.display_name()}
                        </option>
                    }).collect_view()}
                </select>
                <select on:change=on_tone>
                    {Tone::ALL.into_iter().enumerate().map(|(i, t)| view! {
                        <option value=i.to_string() selected=move || state.get().tone == t>
                            {t.to_string()}
                        </option>
                    }).collect_view()}
                </select>
                <select on:change=on_content_type>
                    {ContentType::ALL.into_iter().enumerate().map(|(i, c)| view! {
                        <option value=i.to_string() selected=move || state.get().content_type == c>
                            {c.to_string()}
                        </option>
                    }).collect_view()}
                </select>
                <button on:click=toggle_fullscreen>"⤢"</button>
                <button on:click=toggle_detached>"⧉"</button>
                <button on:click=toggle_right>"◨"</button>
            </header>

            <div class="panels">
                <Show when=move || widths().sidebar > 0>
                    <aside class="sidebar" style=move || format!("width:{}%", widths().sidebar)>
                        <HistoryPanel
                            history=history.clone()
                            changed=handle.history_changed
                            on_open=Callback::new({
                                let handle = handle.clone();
                                move |post: PostData| handle.update(|s| s.edit_post(post))
                            })
                        />
                    </aside>
                </Show>

                <section class="editor" style=move || format!("width:{}%", widths().editor)>
                    <textarea
                        prop:value=move || state.get().content
                        on:input=on_input
                        placeholder="What do you want to share?"
                    ></textarea>
                    <div class="counter" class:over-limit=move || status().over_limit>
                        {move || status().counter}
                        " · "
                        {move || status().stats.words}
                        " words"
                    </div>
                    {move || status().warning.map(|w| view! { <p class="warning">{w}</p> })}
                    <div class="media-picker">
                        <input type="file" multiple accept="image/*,video/*,audio/*" on:change=on_files/>
                        <ul>
                            {move || state.get().media_files.into_iter().map(|file| {
                                let handle = media_handle.clone();
                                let id = file.id.clone();
                                view! {
                                    <li>
                                        {file.name} " (" {file.size / 1024} " KB) "
                                        <button on:click=move |_| {
                                            handle.update(|s| s.remove_media(&id));
                                        }>"✕"</button>
                                    </li>
                                }
                            }).collect_view()}
                        </ul>
                    </div>
                    <input
                        type="datetime-local"
                        prop:value=move || state.get().schedule_date
                        on:input=on_schedule_date
                    />
                    <div class="actions">
                        <button
                            on:click=publish_now
                            disabled=move || state.get().is_publishing || !status().can_publish
                        >
                            {move || if state.get().is_publishing { "Publishing..." } else { "Publish" }}
                        </button>
                        <button on:click=schedule disabled=move || state.get().is_publishing>
                            "Schedule"
                        </button>
                        <button on:click=save_draft>"Save draft"</button>
                    </div>
                </section>

                <Show when=move || widths().preview > 0 || state.get().is_preview_fullscreen>
                    <section
                        class="preview-pane"
                        class:fullscreen=move || state.get().is_preview_fullscreen
                        style=move || LayoutConfig::for_width(viewport_width()).preview_style(&state.get())
                    >
                        <PreviewPane state=state/>
                    </section>
                </Show>
            </div>

            <div class="toasts">
                {move || notices.get().into_iter().rev().take(3).map(|n| {
                    let class = match n.level {
                        NoticeLevel::Info => "toast info",
                        NoticeLevel::Success => "toast success",
                        NoticeLevel::Warning => "toast warning",
                        NoticeLevel::Error => "toast error",
                    };
                    view! {
                        <div class=class>
                            <strong>{n.title}</strong>
                            <span>{n.message}</span>
                        </div>
                    }
                }).collect_view()}
                <Show when=move || !notices.get().is_empty()>
                    <button on:click=move |_| set_notices.set(Vec::new())>"Dismiss"</button>
                </Show>
            </div>
        </div>
    }
}

#[component]
pub fn PreviewPane(state: ReadSignal<StudioState>) -> impl IntoView {
    let (options, set_options) = create_signal(PreviewOptions::default());

    let model = move || {
        let s = state.get();
        let input = PreviewInput {
            content: &s.content,
            content_type: s.content_type,
            selected_media: &s.selected_media,
            platform: s.platform,
        };
        preview::render(&input, &options.get(), |issues| {
            for issue in issues {
                log::debug!("Preview: {}", issue);
            }
        })
    };

    view! {
        <div class="preview-controls">
            {[Device::Mobile, Device::Tablet, Device::Desktop].into_iter().map(|d| view! {
                <button
                    class:active=move || options.get().device == d
                    on:click=move |_| set_options.update(|o| o.device = d)
                >
                    {d.to_string()}
                </button>
            }).collect_view()}
            <button on:click=move |_| set_options.update(|o| o.zoom_out())>"−"</button>
            <span>{move || format!("{}%", options.get().zoom())}</span>
            <button on:click=move |_| set_options.update(|o| o.zoom_in())>"+"</button>
            <button on:click=move |_| set_options.update(|o| o.toggle_dark_mode())>"◐"</button>
        </div>
        {move || {
            let m = model();
            view! {
                <div
                    class=format!("mockup {}", m.platform.as_str())
                    class:dark=m.dark_mode
                    style=format!("width:{}px", m.frame_width)
                >
                    <div class="account">
                        <strong>{m.account_name}</strong>
                        " "
                        <span>{m.handle}</span>
                    </div>
                    <p class="body">{m.body}</p>
                    <p class="tags">
                        {m.hashtags.into_iter().map(|t| view! { <span class="tag">"#" {t}</span> }).collect_view()}
                    </p>
                    <div class="media">
                        {m.media.into_iter().map(|slot| view! {
                            <img src=slot.url alt=format!("{:?}", slot.kind)/>
                        }).collect_view()}
                    </div>
                    <div class="engagement">
                        {m.engagement.likes} " likes · "
                        {m.engagement.comments} " comments · "
                        {m.engagement.shares} " shares"
                    </div>
                    <div class="platform-actions">
                        {m.actions.iter().map(|a| view! { <span>{*a}</span> }).collect_view()}
                    </div>
                    <ul class="issues">
                        {m.issues.into_iter().map(|i| view! { <li class="warning">{i.to_string()}</li> }).collect_view()}
                    </ul>
                </div>
            }
        }}
    }
}

const SORT_ORDERS: [SortOrder; 4] = [
    SortOrder::Newest,
    SortOrder::Oldest,
    SortOrder::Engagement,
    SortOrder::Platform,
];

#[component]
pub fn HistoryPanel(
    history: PostHistory,
    changed: RwSignal<u64>,
    on_open: Callback<PostData>,
) -> impl IntoView {
    let posts = create_rw_signal(Vec::<PostData>::new());
    let (search, set_search) = create_signal(String::new());
    let (status, set_status) = create_signal(None::<PostStatus>);
    let (platform, set_platform) = create_signal(None::<Platform>);
    let (sort, set_sort) = create_signal(SortOrder::Newest);

    create_effect(move |_| {
        changed.track();
        let history = history.clone();
        spawn_local(async move {
            match history.load_all().await {
                Ok(all) => posts.set(all),
                Err(e) => log::error!("Failed to load history: {:#}", e),
            }
        });
    });

    let filtered = move || {
        HistoryQuery {
            search: search.get(),
            status: status.get(),
            platform: platform.get(),
            sort: sort.get(),
        }
        .apply(&posts.get())
    };
    let summary = move || HistorySummary::of(&filtered());

    view! {
        <h3>"History"</h3>
        <input
            type="search"
            placeholder="Search"
            prop:value=move || search.get()
            on:input=move |ev| set_search.set(event_target_value(&ev))
        />
        <select on:change=move |ev| set_status.set(event_target_value(&ev).parse::<PostStatus>().ok())>
            <option value="">"All statuses"</option>
            {PostStatus::ALL.into_iter().map(|s| view! {
                <option value=s.as_str()>{s.to_string()}</option>
            }).collect_view()}
        </select>
        <select on:change=move |ev| set_platform.set(event_target_value(&ev).parse::<Platform>().ok())>
            <option value="">"All platforms"</option>
            {Platform::ALL.into_iter().map(|p| view! {
                <option value=p.as_str()>{p.display_name()}</option>
            }).collect_view()}
        </select>
        <select on:change=move |ev| {
            if let Some(order) = event_target_value(&ev)
                .parse::<usize>()
                .ok()
                .and_then(|i| SORT_ORDERS.get(i).copied())
            {
                set_sort.set(order);
            }
        }>
            {SORT_ORDERS.into_iter().enumerate().map(|(i, s)| view! {
                <option value=i.to_string()>{s.to_string()}</option>
            }).collect_view()}
        </select>
        <button on:click=move |_| changed.update(|n| *n += 1)>"Refresh"</button>
        <p class="summary">
            {move || {
                let s = summary();
                format!("{} posts · {} interactions · reach {}", s.total, s.engagement, s.reach)
            }}
        </p>
        <ul class="history">
            {move || filtered().into_iter().map(|post| {
                let excerpt: String = post.content.chars().take(80).collect();
                let label = format!("{} · {}", post.status, post.created_at.format("%Y-%m-%d"));
                view! {
                    <li on:click=move |_| on_open.call(post.clone())>
                        <small>{label}</small>
                        <p>{excerpt}</p>
                    </li>
                }
            }).collect_view()}
        </ul>
    }
}
