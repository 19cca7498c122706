//! Decides whether a runtime page event fires a configured action class.

use crate::core::element::Element;
use crate::core::url_match::handle_url_filters;
use crate::core::wrap::wrap_throws;
use crate::state::{ActionClass, ActionKind, ElementSelector, NoCodeConfig};

/// Something that happened on the host page.
#[derive(Clone, Copy)]
pub enum RuntimeEvent<'a> {
    /// Developer-invoked `track(key)`.
    Code { key: &'a str },
    PageView,
    ExitIntent,
    FiftyPercentScroll,
    Click { target: &'a dyn Element },
}

impl RuntimeEvent<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeEvent::Code { .. } => "code",
            RuntimeEvent::PageView => "pageView",
            RuntimeEvent::ExitIntent => "exitIntent",
            RuntimeEvent::FiftyPercentScroll => "fiftyPercentScroll",
            RuntimeEvent::Click { .. } => "click",
        }
    }
}

/// Check a click on `target` against a no-code click action.
///
/// Both the `innerHtml` and every whitespace-separated `cssSelector` must
/// match when present, and the page URL must pass the action's filters. An
/// action with neither selector field never fires.
pub fn evaluate_no_code_config_click<E>(target: &E, action: &ActionClass, page_url: &str) -> bool
where
    E: Element + ?Sized,
{
    let ActionKind::NoCode {
        config:
            NoCodeConfig::Click {
                url_filters,
                element_selector,
            },
    } = &action.kind
    else {
        return false;
    };
    let ElementSelector {
        css_selector,
        inner_html,
    } = element_selector;
    let css_selector = css_selector.as_deref().filter(|value| !value.is_empty());
    let inner_html = inner_html.as_deref().filter(|value| !value.is_empty());

    if css_selector.is_none() && inner_html.is_none() {
        tracing::debug!(action = %action.name, "click action has no element selector");
        return false;
    }

    if let Some(expected) = inner_html {
        let mut read_inner_html = wrap_throws(|()| target.inner_html());
        match read_inner_html(()) {
            Ok(actual) if actual == expected => {}
            Ok(_) => return false,
            Err(err) => {
                tracing::warn!(action = %action.name, error = %err, "reading element markup failed");
                return false;
            }
        }
    }

    if let Some(selectors) = css_selector {
        let mut matches = wrap_throws(|selector: &str| target.matches(selector));
        for selector in selectors.split_whitespace() {
            match matches(selector) {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => return false,
                Ok(Err(err)) => {
                    tracing::warn!(action = %action.name, error = %err, "selector not evaluated");
                    return false;
                }
                Err(err) => {
                    tracing::warn!(action = %action.name, error = %err, "element query failed");
                    return false;
                }
            }
        }
    }

    handle_url_filters(url_filters, page_url)
}

/// True if `event` on `page_url` fires `action`.
pub fn action_matches_event(action: &ActionClass, event: RuntimeEvent<'_>, page_url: &str) -> bool {
    match (&action.kind, event) {
        (ActionKind::Code { key }, RuntimeEvent::Code { key: fired }) => key == fired,
        (ActionKind::NoCode { .. }, RuntimeEvent::Click { target }) => {
            evaluate_no_code_config_click(target, action, page_url)
        }
        (
            ActionKind::NoCode {
                config: NoCodeConfig::PageView { url_filters },
            },
            RuntimeEvent::PageView,
        )
        | (
            ActionKind::NoCode {
                config: NoCodeConfig::ExitIntent { url_filters },
            },
            RuntimeEvent::ExitIntent,
        )
        | (
            ActionKind::NoCode {
                config: NoCodeConfig::FiftyPercentScroll { url_filters },
            },
            RuntimeEvent::FiftyPercentScroll,
        ) => handle_url_filters(url_filters, page_url),
        _ => false,
    }
}

/// Action classes fired by `event`, in snapshot order.
pub fn matching_actions<'a>(
    actions: &'a [ActionClass],
    event: RuntimeEvent<'_>,
    page_url: &str,
) -> Vec<&'a ActionClass> {
    let matched: Vec<&ActionClass> = actions
        .iter()
        .filter(|action| action_matches_event(action, event, page_url))
        .collect();
    tracing::debug!(
        event = event.kind(),
        matched = matched.len(),
        "evaluated action classes"
    );
    matched
}
