mod api;
mod components;
mod state;

use leptos::mount::mount_to_body;
use leptos::prelude::*;

use member_messaging::models::MemberId;

use components::inbox::Inbox;
use components::thread::ThreadView;
use state::AppState;

/// Member to open from the `?member=<id>` query of the page URL.
fn member_from_location() -> Option<MemberId> {
    let search = web_sys::window()?.location().search().ok()?;
    search
        .trim_start_matches('?')
        .split('&')
        .find_map(|pair| pair.strip_prefix("member="))
        .and_then(|id| id.parse().ok())
}

/// Root application component.
#[component]
fn App() -> impl IntoView {
    let state = AppState::provide();

    state.load(member_from_location());

    view! {
        <div class="app-container">
            <Inbox />
            <ThreadView />
        </div>
    }
}

fn main() {
    console_log::init_with_level(log::Level::Debug).expect("Failed to init logger");
    mount_to_body(App);
}
