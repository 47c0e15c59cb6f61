//! Document contract consumed by the i18n engine and page scripts.
//!
//! The engine never owns markup. It discovers elements by query each time it
//! needs them, so nodes inserted later (header and footer injection) are
//! still found. [`StaticPage`] is a headless implementation used by the
//! preview binary and the tests.

use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};

/// Attribute holding an element's dot-path translation key.
pub const TRANSLATION_ATTR: &str = "data-i18n";

/// Class on `<body>` that makes the page visible.
pub const LOADED_CLASS: &str = "loaded";

/// Opaque handle to an element of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Subscription handle returned by [`Document::add_change_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Role of an element, fixed when the element enters the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Input,
    TextArea,
    Title,
    Meta,
    Select,
    /// Any other element, with its tag name.
    Container(String),
}

impl ElementKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "input" => ElementKind::Input,
            "textarea" => ElementKind::TextArea,
            "title" => ElementKind::Title,
            "meta" => ElementKind::Meta,
            "select" => ElementKind::Select,
            other => ElementKind::Container(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            ElementKind::Input => "input",
            ElementKind::TextArea => "textarea",
            ElementKind::Title => "title",
            ElementKind::Meta => "meta",
            ElementKind::Select => "select",
            ElementKind::Container(tag) => tag.as_str(),
        }
    }
}

/// Where a translated value is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// Input hint text.
    Placeholder,
    /// The document title.
    DocumentTitle,
    /// The `content` attribute of a metadata element.
    MetaContent,
    /// Rendered markup content.
    InnerHtml,
}

impl From<&ElementKind> for RenderTarget {
    fn from(kind: &ElementKind) -> Self {
        match kind {
            ElementKind::Input | ElementKind::TextArea => RenderTarget::Placeholder,
            ElementKind::Title => RenderTarget::DocumentTitle,
            ElementKind::Meta => RenderTarget::MetaContent,
            ElementKind::Select | ElementKind::Container(_) => RenderTarget::InnerHtml,
        }
    }
}

/// An element carrying a translation key, as found by a fresh query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatableElement {
    pub node: NodeId,
    pub key: String,
    pub target: RenderTarget,
}

/// Callback receiving the new value of a selection control.
pub type ChangeHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Callback run when an element is clicked. It may modify the document.
pub type ClickHandler = Arc<dyn Fn(&mut dyn Document) + Send + Sync>;

/// A document shared between the i18n controller, timers and page scripts.
///
/// Locks are held only for synchronous DOM work, never across a network wait.
pub type SharedDocument<D> = Arc<tokio::sync::Mutex<D>>;

/// Operations the page scripts need from a document.
///
/// Every operation tolerates absent nodes: writing to a node that no longer
/// exists is a no-op.
pub trait Document: Send {
    /// All elements carrying [`TRANSLATION_ATTR`], in document order.
    fn translatable_elements(&self) -> Vec<TranslatableElement>;

    /// Write a value into an element according to its target.
    fn write(&mut self, node: NodeId, target: RenderTarget, value: &str);

    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Elements with tag `tag` nested anywhere inside `node`.
    fn descendants_by_tag(&self, node: NodeId, tag: &str) -> Vec<NodeId>;

    /// Replace `node` and everything inside it with the elements of `html`.
    fn replace_with_html(&mut self, node: NodeId, html: &str);

    fn inner_html(&self, node: NodeId) -> Option<String>;
    fn set_inner_html(&mut self, node: NodeId, html: &str);

    /// Current value of a form control.
    fn value(&self, node: NodeId) -> Option<String>;
    fn set_value(&mut self, node: NodeId, value: &str);

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    fn has_class(&self, node: NodeId, class: &str) -> bool;
    fn add_class(&mut self, node: NodeId, class: &str);
    fn remove_class(&mut self, node: NodeId, class: &str);

    /// The root (`<html>`) element.
    fn root(&self) -> NodeId;
    /// The `<body>` element.
    fn body(&self) -> NodeId;

    fn title(&self) -> String;

    /// Dismiss focus from whichever control holds it, closing native pickers.
    fn blur_active(&mut self);

    fn add_change_listener(&mut self, node: NodeId, handler: ChangeHandler) -> ListenerId;
    fn add_click_listener(&mut self, node: NodeId, handler: ClickHandler) -> ListenerId;
    /// Remove a change or click listener. Returns false when it was already gone.
    fn remove_listener(&mut self, id: ListenerId) -> bool;

    /// A query-string parameter of the current URL.
    fn request_param(&self, name: &str) -> Option<String>;

    /// The client's reported locale, e.g. "fr-FR".
    fn client_locale(&self) -> Option<String>;

    fn navigate(&mut self, url: &str);
}

/// Elements that never have content or a closing tag.
const VOID_TAGS: [&str; 8] = ["area", "br", "hr", "img", "input", "link", "meta", "source"];

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static ATTR_REGEX: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone)]
struct Element {
    id: Option<String>,
    kind: ElementKind,
    parent: Option<NodeId>,
    /// Removed from the document; kept so node ids stay stable.
    detached: bool,
    attributes: HashMap<String, String>,
    classes: BTreeSet<String>,
    inner_html: String,
    placeholder: Option<String>,
    value: Option<String>,
}

#[derive(Clone)]
enum Listener {
    Change(ChangeHandler),
    Click(ClickHandler),
}

/// Headless in-memory document.
///
/// Markup handed to [`Document::replace_with_html`] is split into elements
/// with a small tag scanner. Only double or single quoted attributes are
/// recognised.
pub struct StaticPage {
    elements: Vec<Element>,
    title: String,
    focused: Option<NodeId>,
    listeners: HashMap<ListenerId, (NodeId, Listener)>,
    next_listener: u64,
    query: HashMap<String, String>,
    locale: Option<String>,
    location: String,
}

impl StaticPage {
    /// An empty page with `<html>` and `<body>` elements.
    pub fn new() -> Self {
        let mut page = Self {
            elements: Vec::new(),
            title: String::new(),
            focused: None,
            listeners: HashMap::new(),
            next_listener: 0,
            query: HashMap::new(),
            locale: None,
            location: "/".to_string(),
        };
        let html = page.push(None, ElementKind::Container("html".to_string()), None);
        page.push(Some(html), ElementKind::Container("body".to_string()), None);
        page
    }

    /// Parse `?lang=uk&x=y` (leading `?` optional) into request parameters.
    /// Names and values are percent-decoded.
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        self
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_string());
        self
    }

    /// Append an element to `<body>`, optionally with an id.
    pub fn insert(&mut self, kind: ElementKind, id: Option<&str>) -> NodeId {
        let body = self.body();
        self.push(Some(body), kind, id)
    }

    /// Append an element tagged with a translation key.
    pub fn insert_translatable(&mut self, kind: ElementKind, key: &str, fallback: &str) -> NodeId {
        let node = self.insert(kind, None);
        self.set_attribute(node, TRANSLATION_ATTR, key);
        self.set_inner_html(node, fallback);
        node
    }

    pub fn placeholder(&self, node: NodeId) -> Option<String> {
        self.element(node).and_then(|e| e.placeholder.clone())
    }

    pub fn focus(&mut self, node: NodeId) {
        if self.element(node).is_some() {
            self.focused = Some(node);
        }
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Change and click listeners registered on `node`.
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.listeners.values().filter(|(n, _)| *n == node).count()
    }

    /// Simulate a user picking `value` in a selection control.
    ///
    /// Handlers run synchronously after the value is updated.
    pub fn dispatch_change(&mut self, node: NodeId, value: &str) {
        self.set_value(node, value);
        let handlers: Vec<ChangeHandler> = self
            .listeners_on(node)
            .filter_map(|listener| match listener {
                Listener::Change(handler) => Some(handler),
                Listener::Click(_) => None,
            })
            .collect();
        for handler in handlers {
            handler(value);
        }
    }

    /// Simulate a click on `node`.
    pub fn click(&mut self, node: NodeId) {
        let handlers: Vec<ClickHandler> = self
            .listeners_on(node)
            .filter_map(|listener| match listener {
                Listener::Click(handler) => Some(handler),
                Listener::Change(_) => None,
            })
            .collect();
        for handler in handlers {
            let doc: &mut dyn Document = &mut *self;
            handler(doc);
        }
    }

    fn listeners_on(&self, node: NodeId) -> impl Iterator<Item = Listener> + '_ {
        self.listeners
            .values()
            .filter(move |(n, _)| *n == node)
            .map(|(_, listener)| listener.clone())
    }

    fn add_listener(&mut self, node: NodeId, listener: Listener) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.insert(id, (node, listener));
        id
    }

    fn push(&mut self, parent: Option<NodeId>, kind: ElementKind, id: Option<&str>) -> NodeId {
        self.elements.push(Element {
            id: id.map(String::from),
            kind,
            parent,
            detached: false,
            attributes: HashMap::new(),
            classes: BTreeSet::new(),
            inner_html: String::new(),
            placeholder: None,
            value: None,
        });
        NodeId(self.elements.len() - 1)
    }

    fn element(&self, node: NodeId) -> Option<&Element> {
        self.elements.get(node.0).filter(|e| !e.detached)
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.elements.get_mut(node.0).filter(|e| !e.detached)
    }

    fn is_inside(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.elements.get(node.0).and_then(|e| e.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.elements.get(parent.0).and_then(|e| e.parent);
        }
        false
    }

    /// Detach `node` and every element nested in it.
    fn detach(&mut self, node: NodeId) {
        let nested: Vec<NodeId> = (0..self.elements.len())
            .map(NodeId)
            .filter(|&n| n == node || self.is_inside(n, node))
            .collect();
        for n in nested {
            self.elements[n.0].detached = true;
            self.listeners.retain(|_, (target, _)| *target != n);
        }
    }

    /// Create elements for every tag in `html`, nested under `parent`.
    fn insert_fragment(&mut self, parent: Option<NodeId>, html: &str) {
        let tag_regex = TAG_REGEX.get_or_init(|| {
            Regex::new(r#"<(/?)([a-zA-Z][a-zA-Z0-9-]*)((?:\s[^>]*?)?)\s*(/?)>"#).unwrap()
        });
        let attr_regex = ATTR_REGEX.get_or_init(|| {
            Regex::new(r#"([^\s=/]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
        });

        // (node, tag name, byte offset where its content starts)
        let mut open: Vec<(NodeId, String, usize)> = Vec::new();

        for cap in tag_regex.captures_iter(html) {
            let Some(whole) = cap.get(0) else { continue };
            let name = cap[2].to_ascii_lowercase();

            if &cap[1] == "/" {
                if let Some(pos) = open.iter().rposition(|(_, tag, _)| *tag == name) {
                    let (node, _, start) = open[pos].clone();
                    open.truncate(pos);
                    self.set_inner_html(node, &html[start..whole.start()]);
                }
                continue;
            }

            let parent = open.last().map(|(node, _, _)| *node).or(parent);
            let node = self.push(parent, ElementKind::from_tag(&name), None);
            for attr in attr_regex.captures_iter(&cap[3]) {
                let value = attr.get(2).or_else(|| attr.get(3)).map_or("", |m| m.as_str());
                match &attr[1] {
                    "id" => self.elements[node.0].id = Some(value.to_string()),
                    "class" => {
                        for class in value.split_whitespace() {
                            self.add_class(node, class);
                        }
                    }
                    other => self.set_attribute(node, other, value),
                }
            }

            if cap[4].is_empty() && !VOID_TAGS.contains(&name.as_str()) {
                open.push((node, name, whole.end()));
            }
        }
    }
}

impl Default for StaticPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for StaticPage {
    fn translatable_elements(&self) -> Vec<TranslatableElement> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, element)| !element.detached)
            .filter_map(|(index, element)| {
                let key = element.attributes.get(TRANSLATION_ATTR)?;
                Some(TranslatableElement {
                    node: NodeId(index),
                    key: key.clone(),
                    target: RenderTarget::from(&element.kind),
                })
            })
            .collect()
    }

    fn write(&mut self, node: NodeId, target: RenderTarget, value: &str) {
        match target {
            RenderTarget::DocumentTitle => self.title = value.to_string(),
            RenderTarget::Placeholder => {
                if let Some(element) = self.element_mut(node) {
                    element.placeholder = Some(value.to_string());
                }
            }
            RenderTarget::MetaContent => self.set_attribute(node, "content", value),
            RenderTarget::InnerHtml => self.set_inner_html(node, value),
        }
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.elements
            .iter()
            .position(|e| !e.detached && e.id.as_deref() == Some(id))
            .map(NodeId)
    }

    fn descendants_by_tag(&self, node: NodeId, tag: &str) -> Vec<NodeId> {
        (0..self.elements.len())
            .map(NodeId)
            .filter(|&n| {
                self.element(n).is_some_and(|e| e.kind.tag().eq_ignore_ascii_case(tag))
                    && self.is_inside(n, node)
            })
            .collect()
    }

    fn replace_with_html(&mut self, node: NodeId, html: &str) {
        let Some(parent) = self.element(node).map(|e| e.parent) else {
            return;
        };
        self.detach(node);
        self.insert_fragment(parent, html);
    }

    fn inner_html(&self, node: NodeId) -> Option<String> {
        self.element(node).map(|e| e.inner_html.clone())
    }

    fn set_inner_html(&mut self, node: NodeId, html: &str) {
        if let Some(element) = self.element_mut(node) {
            element.inner_html = html.to_string();
        }
    }

    fn value(&self, node: NodeId) -> Option<String> {
        self.element(node).and_then(|e| e.value.clone())
    }

    fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.value = Some(value.to_string());
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)
            .and_then(|e| e.attributes.get(name).cloned())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|e| e.classes.contains(class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node) {
            element.classes.insert(class.to_string());
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node) {
            element.classes.remove(class);
        }
    }

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn body(&self) -> NodeId {
        NodeId(1)
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn blur_active(&mut self) {
        self.focused = None;
    }

    fn add_change_listener(&mut self, node: NodeId, handler: ChangeHandler) -> ListenerId {
        self.add_listener(node, Listener::Change(handler))
    }

    fn add_click_listener(&mut self, node: NodeId, handler: ClickHandler) -> ListenerId {
        self.add_listener(node, Listener::Click(handler))
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    fn request_param(&self, name: &str) -> Option<String> {
        self.query.get(name).cloned()
    }

    fn client_locale(&self) -> Option<String> {
        self.locale.clone()
    }

    fn navigate(&mut self, url: &str) {
        self.location = url.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_render_target_classification() {
        assert_eq!(RenderTarget::from(&ElementKind::Input), RenderTarget::Placeholder);
        assert_eq!(RenderTarget::from(&ElementKind::TextArea), RenderTarget::Placeholder);
        assert_eq!(RenderTarget::from(&ElementKind::Title), RenderTarget::DocumentTitle);
        assert_eq!(RenderTarget::from(&ElementKind::Meta), RenderTarget::MetaContent);
        assert_eq!(
            RenderTarget::from(&ElementKind::Container("p".into())),
            RenderTarget::InnerHtml
        );
    }

    #[test]
    fn test_query_parsing() {
        let page = StaticPage::new().with_query("?lang=uk&utm=x&broken&=v");
        assert_eq!(page.request_param("lang").as_deref(), Some("uk"));
        assert_eq!(page.request_param("utm").as_deref(), Some("x"));
        assert_eq!(page.request_param("broken"), None);
    }

    #[test]
    fn test_query_values_are_percent_decoded() {
        let page = StaticPage::new().with_query("lang=%75k&ref=spring+sale");
        assert_eq!(page.request_param("lang").as_deref(), Some("uk"));
        assert_eq!(page.request_param("ref").as_deref(), Some("spring sale"));
    }

    #[test]
    fn test_translatable_elements_in_document_order() {
        let mut page = StaticPage::new();
        page.insert(ElementKind::Container("div".into()), Some("plain"));
        let a = page.insert_translatable(ElementKind::Title, "meta.title", "");
        let b = page.insert_translatable(ElementKind::Input, "form.email", "");

        let found = page.translatable_elements();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].node, a);
        assert_eq!(found[0].target, RenderTarget::DocumentTitle);
        assert_eq!(found[1].node, b);
        assert_eq!(found[1].key, "form.email");
    }

    #[test]
    fn test_write_targets() {
        let mut page = StaticPage::new();
        let input = page.insert(ElementKind::Input, None);
        let meta = page.insert(ElementKind::Meta, None);
        let p = page.insert(ElementKind::Container("p".into()), None);

        page.write(input, RenderTarget::Placeholder, "Email");
        page.write(meta, RenderTarget::MetaContent, "desc");
        page.write(p, RenderTarget::InnerHtml, "<b>Hi</b>");
        page.write(p, RenderTarget::DocumentTitle, "Title");

        assert_eq!(page.placeholder(input).as_deref(), Some("Email"));
        assert_eq!(page.attribute(meta, "content").as_deref(), Some("desc"));
        assert_eq!(page.inner_html(p).as_deref(), Some("<b>Hi</b>"));
        assert_eq!(page.title(), "Title");
    }

    #[test]
    fn test_dispatch_change_runs_listeners_until_removed() {
        let mut page = StaticPage::new();
        let select = page.insert(ElementKind::Select, Some("language-switcher"));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let id = page.add_change_listener(
            select,
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        page.dispatch_change(select, "de");
        assert_eq!(page.value(select).as_deref(), Some("de"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(page.remove_listener(id));
        assert!(!page.remove_listener(id));
        page.dispatch_change(select, "fr");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_replace_with_html_builds_nested_elements() {
        let mut page = StaticPage::new();
        let placeholder = page.insert(ElementKind::Container("div".into()), Some("header-placeholder"));
        page.replace_with_html(
            placeholder,
            r#"<header class="sticky top-0">
                <a href="/" data-i18n="nav.home">Home</a>
                <select id="language-switcher"><option value="en">EN</option></select>
                <input type="email" data-i18n="form.email" />
                <div id="mobile-menu" class='hidden'><a href="/faq">FAQ</a><br><a href="/about">About</a></div>
            </header>"#,
        );

        assert_eq!(page.element_by_id("header-placeholder"), None);
        assert_eq!(page.inner_html(placeholder), None);

        let keys: Vec<String> = page.translatable_elements().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["nav.home", "form.email"]);
        let input = page.translatable_elements()[1].clone();
        assert_eq!(input.target, RenderTarget::Placeholder);

        let switcher = page.element_by_id("language-switcher").unwrap();
        assert_eq!(page.attribute(switcher, "id"), None);
        let menu = page.element_by_id("mobile-menu").unwrap();
        assert!(page.has_class(menu, "hidden"));
        assert_eq!(page.descendants_by_tag(menu, "a").len(), 2);
        assert_eq!(page.descendants_by_tag(page.body(), "a").len(), 3);
        assert_eq!(
            page.inner_html(menu).as_deref(),
            Some(r#"<a href="/faq">FAQ</a><br><a href="/about">About</a>"#)
        );
    }

    #[test]
    fn test_replaced_node_loses_listeners() {
        let mut page = StaticPage::new();
        let node = page.insert(ElementKind::Select, Some("language-switcher"));
        page.add_change_listener(node, Arc::new(|_| {}));
        page.replace_with_html(node, "<p>gone</p>");
        assert_eq!(page.listener_count(node), 0);
    }

    #[test]
    fn test_click_handlers_can_modify_the_page() {
        let mut page = StaticPage::new();
        let button = page.insert(ElementKind::Container("button".into()), None);
        let panel = page.insert(ElementKind::Container("div".into()), None);

        let id = page.add_click_listener(
            button,
            Arc::new(move |doc: &mut dyn Document| doc.add_class(panel, "open")),
        );
        page.click(button);
        assert!(page.has_class(panel, "open"));

        // Change dispatch does not reach click handlers
        page.remove_class(panel, "open");
        page.dispatch_change(button, "x");
        assert!(!page.has_class(panel, "open"));

        assert!(page.remove_listener(id));
        page.click(button);
        assert!(!page.has_class(panel, "open"));
    }

    #[test]
    fn test_missing_nodes_are_tolerated() {
        let mut page = StaticPage::new();
        let ghost = NodeId(99);
        page.set_inner_html(ghost, "x");
        page.add_class(ghost, "loaded");
        page.focus(ghost);
        assert_eq!(page.inner_html(ghost), None);
        assert!(!page.has_class(ghost, "loaded"));
        assert_eq!(page.focused(), None);
    }
}
