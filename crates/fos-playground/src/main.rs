//! fOS Playground - scripted directive session
//!
//! Builds a small page (a dropdown, a search box, a keyboard shortcut),
//! binds its directives, replays a sequence of user actions on the virtual
//! clock and logs how the scope reacts.
//!
//! Usage: `fos-playground [config.json]`. Set `RUST_LOG=debug` to see
//! bindings come and go, `trace` for suppressed firings.

use std::time::Duration;

use anyhow::{Context, Result};
use fos_directives::{DirectiveConfig, DirectiveRuntime};
use fos_dom::{Dom, KeyModifiers, KeyboardEventInit, NodeId};
use fos_js::{JsValue, Scope, TimerManager};
use tracing_subscriber::EnvFilter;

struct Page {
    dom: Dom,
    timers: TimerManager,
    runtime: DirectiveRuntime,
    scope: Scope,
    toggle: NodeId,
    menu: NodeId,
    search: NodeId,
    remember: NodeId,
}

fn load_config() -> Result<DirectiveConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(DirectiveConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

fn build_page(config: DirectiveConfig) -> Result<Page> {
    let dom = Dom::new("about:playground");
    let timers = TimerManager::new();

    let body = dom.body();
    let header = dom.append_element(body, "header")?;
    let toggle = dom.append_element(header, "button")?;
    let menu = dom.append_element(header, "ul")?;
    dom.append_element(menu, "li")?;
    let search = dom.append_element(body, "input")?;
    let remember = dom.append_element(body, "input")?;
    dom.set_attribute(remember, "type", "checkbox")?;
    dom.set_size(menu, 160.0, 80.0)?;

    dom.set_attribute(toggle, "@click", "open = !open")?;
    dom.set_attribute(menu, "@click.away", "open = false")?;
    dom.set_attribute(search, "x-on:input.debounce.300ms", "query = $event.value; searches++")?;
    dom.set_attribute(search, "x-on:keydown.escape", "query = ''")?;
    dom.set_attribute(remember, "@click", "locked ? false : undefined")?;

    let scope = Scope::from_pairs([
        ("open", JsValue::Bool(false)),
        ("query", JsValue::from("")),
        ("searches", JsValue::from(0)),
        ("saves", JsValue::from(0)),
        ("locked", JsValue::Bool(true)),
    ]);
    scope.subscribe(|change| tracing::info!("  {} : {} -> {}", change.path, change.old, change.new));

    let runtime = DirectiveRuntime::builder(dom.clone())
        .timers(timers.clone())
        .config(config)
        .build();
    runtime.on_error(|failure| tracing::info!("  reported: {}", failure.error));

    for element in [toggle, menu, search, remember] {
        runtime.bind_attributes(element, &scope)?;
    }
    runtime.bind(body, "@keydown.window.ctrl.s.prevent", "saves++", &scope)?;

    Ok(Page {
        dom,
        timers,
        runtime,
        scope,
        toggle,
        menu,
        search,
        remember,
    })
}

fn run(page: &Page) {
    tracing::info!("Open the menu, click inside it, then click elsewhere");
    page.dom.click(page.toggle);
    page.dom.click(page.menu);
    page.dom.click(page.search);

    tracing::info!("Type a search term in a burst");
    for text in ["r", "ru", "rus", "rust"] {
        page.dom.input(page.search, text);
        page.timers.advance(Duration::from_millis(80));
    }
    page.timers.advance(Duration::from_millis(300));
    tracing::info!("Escape clears the query");
    page.dom.key_down(page.search, KeyboardEventInit::key("Escape"));

    tracing::info!("Ctrl+S anywhere saves");
    let save = page.dom.key_down(
        page.remember,
        KeyboardEventInit::key("s").with_modifiers(KeyModifiers::ctrl()),
    );
    page.dom.key_down(page.remember, KeyboardEventInit::key("s"));
    tracing::info!("  ctrl+s default prevented: {}", save.is_default_prevented());

    tracing::info!("A locked checkbox refuses to toggle");
    page.dom.click(page.remember);
    tracing::info!("  checked: {}", page.dom.is_checked(page.remember));
    page.scope.set("locked", JsValue::Bool(false));
    page.dom.click(page.remember);
    tracing::info!("  checked: {}", page.dom.is_checked(page.remember));

    tracing::info!("A broken expression is reported, not thrown");
    if let Err(err) = page.runtime.bind(page.toggle, "@dblclick", "menu.items.length", &page.scope) {
        tracing::warn!("bind failed: {}", err);
    }
    page.dom.dispatch_event(fos_dom::EventTarget::Node(page.toggle), fos_dom::Event::new("dblclick"));

    tracing::info!("Removing the menu drops its binding");
    let before = page.runtime.binding_count();
    if let Err(err) = page.dom.remove_node(page.menu) {
        tracing::warn!("remove failed: {}", err);
    }
    tracing::info!("  bindings: {} -> {}", before, page.runtime.binding_count());
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = load_config()?;
    tracing::info!("Starting fOS playground");

    let page = build_page(config)?;
    run(&page);

    tracing::info!("Final scope: {}", page.scope.snapshot());
    Ok(())
}
