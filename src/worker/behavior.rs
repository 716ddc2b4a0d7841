//! Human-interaction simulation
//!
//! After a page loads, the browser worker plays back one randomly chosen
//! interaction so the session produces input and scroll events a real visitor
//! would. Every simulation is best effort: failures are logged and swallowed,
//! never surfaced to the fetch pipeline.

use chromiumoxide::Page;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

const SEARCH_INPUT_SELECTOR: &str = "input[type='text'], input[type='search']";
const TYPED_QUERY: &str = "test search";

const SMOOTH_SCROLL_JS: &str = r#"
(async () => {
    const step = Math.max(200, Math.floor(window.innerHeight / 2));
    const bottom = Math.max(document.body.scrollHeight - window.innerHeight, 0);
    for (let y = 0; y <= bottom; y += step) {
        window.scrollTo({ top: y, behavior: 'smooth' });
        await new Promise(r => setTimeout(r, 120));
    }
    window.scrollTo({ top: 0, behavior: 'smooth' });
})()
"#;

const SCROLLBAR_DRAG_JS: &str = r#"
(async () => {
    const bottom = Math.max(document.body.scrollHeight - window.innerHeight, 0);
    const steps = 20;
    for (let i = 0; i <= steps; i++) {
        window.scrollTo(0, Math.floor(bottom * i / steps));
        await new Promise(r => setTimeout(r, 50));
    }
})()
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interaction {
    FakeTyping,
    SmoothScroll,
    ScrollbarDrag,
}

const INTERACTIONS: &[Interaction] = &[
    Interaction::FakeTyping,
    Interaction::SmoothScroll,
    Interaction::ScrollbarDrag,
];

/// Plays one randomly chosen interaction on the loaded page
pub async fn simulate_visitor(page: &Page) {
    let choice = INTERACTIONS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(Interaction::SmoothScroll);

    let result = match choice {
        Interaction::FakeTyping => fake_typing(page).await,
        Interaction::SmoothScroll => page.evaluate(SMOOTH_SCROLL_JS).await.map(|_| ()),
        Interaction::ScrollbarDrag => page.evaluate(SCROLLBAR_DRAG_JS).await.map(|_| ()),
    };

    if let Err(e) = result {
        tracing::warn!("Interaction simulation ({:?}) failed: {}", choice, e);
    }
}

/// Types into the first visible text input, then erases one character
async fn fake_typing(page: &Page) -> Result<(), chromiumoxide::error::CdpError> {
    let input = match page.find_element(SEARCH_INPUT_SELECTOR).await {
        Ok(element) => element,
        Err(_) => {
            // Pages without a text input fall back to scrolling
            return page.evaluate(SMOOTH_SCROLL_JS).await.map(|_| ());
        }
    };

    input.click().await?;
    for ch in TYPED_QUERY.chars() {
        input.type_str(ch.to_string()).await?;
        let pause = rand::thread_rng().gen_range(60..180);
        sleep(Duration::from_millis(pause)).await;
    }
    input.press_key("Backspace").await?;
    Ok(())
}
