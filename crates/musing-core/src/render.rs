//! Outbound messages, keyboards, and the views built from store records

use serde::Serialize;

use crate::callback::Callback;
use crate::model::{TagUsage, Thought, ThoughtId};
use crate::pager::paginate;
use crate::transport::MessageRef;

/// User-facing strings
pub mod labels {
    pub const MENU_VIEW_THOUGHTS: &str = "Посмотреть мысли";
    pub const MENU_ADD_THOUGHT: &str = "Добавить мысль";
    pub const CANCEL: &str = "❌ Отмена";

    pub const GREETING: &str = "Привет! Выбери действие:";
    pub const ASK_THOUGHT: &str = "Введите вашу мысль:";
    pub const CANCELLED: &str = "Отменено.";
    pub const SAVED_PICK_TAG: &str = "Записал! Выбери тег:";
    pub const TAG_ASSIGNED: &str = "✅ Тег присвоен, мысль сохранена в хранилище!";
    pub const WHAT_NEXT: &str = "Что дальше?";
    pub const ASK_CUSTOM_TAG: &str = "Введите свой тег:";
    pub const ADD_CUSTOM_TAG: &str = "➕ Добавить свой тег";
    pub const ASK_EDIT_TEXT: &str = "Введите новый текст для этой мысли:";
    pub const THOUGHT_UPDATED: &str = "✅ Мысль обновлена!";
    pub const ASK_DELETE: &str = "Вы уверены, что хотите удалить эту мысль?";
    pub const CONFIRM_YES: &str = "✅ Да";
    pub const CONFIRM_NO: &str = "❌ Нет";
    pub const THOUGHT_DELETED: &str = "✅ Мысль удалена!";
    pub const DELETE_CANCELLED: &str = "❌ Удаление отменено.";
    pub const CONFIRMATION_EXPIRED: &str = "⌛ Это подтверждение уже неактуально.";
    pub const NO_THOUGHTS: &str = "Нет сохранённых мыслей.";
    pub const PAGE_EMPTY: &str = "На этой странице ничего нет.";
    pub const BACK_TO_START: &str = "⏮ В начало";
    pub const NAV_PREV: &str = "⬅️ Назад";
    pub const NAV_NEXT: &str = "➡️ Вперёд";
    pub const EDIT_BUTTON: &str = "✏️";
    pub const DELETE_BUTTON: &str = "🗑";

    pub const EMPTY_TEXT: &str = "Мысль не может быть пустой. Попробуйте ещё раз:";
    pub const EMPTY_TAG: &str = "Тег не может быть пустым. Попробуйте ещё раз:";
    pub const TAG_TOO_LONG: &str = "Тег слишком длинный. Попробуйте короче:";
    pub const NOT_FOUND: &str = "⚠️ Мысль не найдена. Возможно, она уже удалена.";
    pub const STORAGE_UNAVAILABLE: &str = "⚠️ Хранилище недоступно, попробуйте позже.";
    pub const FAILED: &str = "⚠️ Не удалось выполнить действие.";
}

/// Longest list text sent in one message, in UTF-16 units.
///
/// The Bot API rejects anything over 4096.
pub const MAX_MESSAGE_UNITS: usize = 4000;

/// How the transport should parse message text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TextFormat {
    #[default]
    Plain,
    Markdown,
}

/// One inline button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub callback: Callback,
}

impl Button {
    pub fn new(label: impl Into<String>, callback: Callback) -> Self {
        Self {
            label: label.into(),
            callback,
        }
    }
}

/// Grid of inline buttons attached to one message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<Button>>,
}

impl InlineKeyboard {
    /// All buttons, row by row
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// Find the first button whose callback matches
    pub fn find(&self, predicate: impl Fn(&Callback) -> bool) -> Option<&Button> {
        self.buttons().find(|b| predicate(&b.callback))
    }
}

/// Static reply menus shown under the input field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    /// "view thoughts" / "add thought"
    Main,
    /// single cancel button, hidden after one use
    Cancel,
}

impl Menu {
    pub fn rows(&self) -> Vec<Vec<&'static str>> {
        match self {
            Menu::Main => vec![
                vec![labels::MENU_VIEW_THOUGHTS],
                vec![labels::MENU_ADD_THOUGHT],
            ],
            Menu::Cancel => vec![vec![labels::CANCEL]],
        }
    }

    pub fn one_time(&self) -> bool {
        matches!(self, Menu::Cancel)
    }
}

/// Keyboard attached to a sent message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    Menu(Menu),
    Inline(InlineKeyboard),
}

/// One outbound render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Send {
        text: String,
        markup: Option<Markup>,
        format: TextFormat,
    },
    Edit {
        message: MessageRef,
        text: String,
        keyboard: Option<InlineKeyboard>,
        format: TextFormat,
    },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Send {
            text: text.into(),
            markup: None,
            format: TextFormat::Plain,
        }
    }

    pub fn with_menu(text: impl Into<String>, menu: Menu) -> Self {
        Reply::Send {
            text: text.into(),
            markup: Some(Markup::Menu(menu)),
            format: TextFormat::Plain,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: InlineKeyboard) -> Self {
        Reply::Send {
            text: text.into(),
            markup: Some(Markup::Inline(keyboard)),
            format: TextFormat::Plain,
        }
    }

    pub fn edit(message: MessageRef, text: impl Into<String>) -> Self {
        Reply::Edit {
            message,
            text: text.into(),
            keyboard: None,
            format: TextFormat::Plain,
        }
    }

    /// Message text, whichever variant
    pub fn body(&self) -> &str {
        match self {
            Reply::Send { text, .. } | Reply::Edit { text, .. } => text,
        }
    }

    /// Inline keyboard, whichever variant
    pub fn inline_keyboard(&self) -> Option<&InlineKeyboard> {
        match self {
            Reply::Send {
                markup: Some(Markup::Inline(keyboard)),
                ..
            } => Some(keyboard),
            Reply::Edit {
                keyboard: Some(keyboard),
                ..
            } => Some(keyboard),
            _ => None,
        }
    }
}

/// Which list is being paged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    All,
    Tag(String),
}

impl ListScope {
    fn page_callback(&self, page: usize) -> Callback {
        match self {
            ListScope::All => Callback::ThoughtsPage { page },
            ListScope::Tag(tag) => Callback::TagPage {
                tag: tag.clone(),
                page,
            },
        }
    }
}

/// A rendered list page: Markdown text plus optional keyboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

impl ListView {
    /// As a new message
    pub fn into_send(self) -> Reply {
        Reply::Send {
            text: self.text,
            markup: self.keyboard.map(Markup::Inline),
            format: TextFormat::Markdown,
        }
    }

    /// As an edit of an existing message
    pub fn into_edit(self, message: MessageRef) -> Reply {
        Reply::Edit {
            message,
            text: self.text,
            keyboard: self.keyboard,
            format: TextFormat::Markdown,
        }
    }
}

/// Render page `page` of `thoughts` (already in display order)
pub fn list_view(scope: &ListScope, thoughts: &[Thought], page: usize, page_size: usize) -> ListView {
    if thoughts.is_empty() {
        let text = match scope {
            ListScope::All => labels::NO_THOUGHTS.to_string(),
            ListScope::Tag(tag) => format!("Нет мыслей с тегом #{}.", escape_markdown(tag)),
        };
        return ListView {
            text,
            keyboard: None,
        };
    }

    let window = paginate(thoughts, page, page_size);
    if window.is_empty() {
        return ListView {
            text: labels::PAGE_EMPTY.to_string(),
            keyboard: Some(InlineKeyboard {
                rows: vec![vec![Button::new(
                    labels::BACK_TO_START,
                    scope.page_callback(0),
                )]],
            }),
        };
    }

    let header = match scope {
        ListScope::All => String::new(),
        ListScope::Tag(tag) => format!("Мысли с тегом {}:\n\n", italic(&format!("#{tag}"))),
    };
    let count = window.items.len();
    let separators = 2 * (count - 1);
    let per_entry = MAX_MESSAGE_UNITS.saturating_sub(utf16_len(&header) + separators) / count;

    let mut entries = Vec::with_capacity(count);
    let mut rows = Vec::with_capacity(count + 1);

    for thought in window.items {
        let date = thought.created_at.format("%Y-%m-%d");
        let plain = format!("{} (📅 {date})", thought.text);

        let mut suffix = format!(" (📅 {date})");
        if let (ListScope::All, Some(tag)) = (scope, &thought.tag) {
            suffix.push('\n');
            suffix.push_str(&italic(&format!("#{}", tag.name)));
        }
        let budget = per_entry.saturating_sub(utf16_len(&suffix));
        entries.push(format!("{}{suffix}", escape_within(&thought.text, budget)));

        rows.push(vec![
            Button::new(plain.chars().take(10).collect::<String>(), Callback::Noop),
            Button::new(
                labels::EDIT_BUTTON,
                Callback::EditThought {
                    thought_id: thought.id,
                },
            ),
            Button::new(
                labels::DELETE_BUTTON,
                Callback::DeleteThought {
                    thought_id: thought.id,
                },
            ),
        ]);
    }

    let mut nav = Vec::new();
    if window.has_prev {
        nav.push(Button::new(labels::NAV_PREV, scope.page_callback(page - 1)));
    }
    if window.has_next {
        nav.push(Button::new(labels::NAV_NEXT, scope.page_callback(page + 1)));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }

    let text = header + &entries.join("\n\n");

    ListView {
        text,
        keyboard: Some(InlineKeyboard { rows }),
    }
}

/// Tag picker for a freshly saved thought
pub fn tag_picker(thought_id: ThoughtId, top: &[TagUsage]) -> InlineKeyboard {
    let mut rows: Vec<Vec<Button>> = top
        .iter()
        .map(|usage| {
            vec![Button::new(
                format!("{} ({})", usage.tag.name, usage.count),
                Callback::AssignTag {
                    thought_id,
                    tag_id: usage.tag.id,
                },
            )]
        })
        .collect();

    rows.push(vec![Button::new(
        labels::ADD_CUSTOM_TAG,
        Callback::CustomTag { thought_id },
    )]);

    InlineKeyboard { rows }
}

/// Yes/no keyboard for delete confirmation
pub fn delete_prompt() -> InlineKeyboard {
    InlineKeyboard {
        rows: vec![
            vec![Button::new(labels::CONFIRM_YES, Callback::ConfirmDelete)],
            vec![Button::new(labels::CONFIRM_NO, Callback::CancelDelete)],
        ],
    }
}

const MARKDOWN_SPECIALS: [char; 4] = ['_', '*', '`', '['];

const ELLIPSIS: char = '…';

/// Escape characters that legacy Markdown treats as entity markers
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_SPECIALS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escaped `text`, cut short with an ellipsis when it would not fit in
/// `budget` UTF-16 units
fn escape_within(text: &str, budget: usize) -> String {
    let escaped = escape_markdown(text);
    if utf16_len(&escaped) <= budget {
        return escaped;
    }

    let mut out = String::new();
    let mut used = ELLIPSIS.len_utf16();
    for c in text.chars() {
        let special = MARKDOWN_SPECIALS.contains(&c);
        let cost = c.len_utf16() + usize::from(special);
        if used + cost > budget {
            break;
        }
        if special {
            out.push('\\');
        }
        out.push(c);
        used += cost;
    }
    out.push(ELLIPSIS);
    out
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Italic when the text can be wrapped safely; escaping is not allowed inside entities
fn italic(text: &str) -> String {
    if text.contains(&MARKDOWN_SPECIALS[..]) {
        escape_markdown(text)
    } else {
        format!("_{text}_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Tag, TagId, UserId};
    use chrono::{TimeZone, Utc};

    fn thought(id: i64, text: &str, tag: Option<&str>) -> Thought {
        Thought {
            id: ThoughtId(id),
            owner_id: UserId(1),
            text: text.to_string(),
            tag: tag.map(|name| Tag {
                id: TagId(1),
                name: name.to_string(),
            }),
            image_path: None,
            created_at: Utc.with_ymd_and_hms(2025, 2, 14, 8, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_list() {
        let view = list_view(&ListScope::All, &[], 0, 5);
        assert_eq!(view.text, labels::NO_THOUGHTS);
        assert!(view.keyboard.is_none());

        let view = list_view(&ListScope::Tag("work".into()), &[], 0, 5);
        assert_eq!(view.text, "Нет мыслей с тегом #work.");
    }

    #[test]
    fn test_entry_format_and_actions() {
        let thoughts = vec![thought(7, "buy milk", Some("errands")), thought(3, "plain", None)];
        let view = list_view(&ListScope::All, &thoughts, 0, 5);

        assert_eq!(
            view.text,
            "buy milk (📅 2025-02-14)\n_#errands_\n\nplain (📅 2025-02-14)"
        );

        let keyboard = view.keyboard.unwrap();
        assert_eq!(keyboard.rows.len(), 2);
        let row = &keyboard.rows[0];
        assert_eq!(row[0].label, "buy milk (");
        assert_eq!(row[0].callback, Callback::Noop);
        assert_eq!(row[1].callback.encode(), "edit_thought:7");
        assert_eq!(row[2].callback.encode(), "delete_thought:7");
    }

    #[test]
    fn test_navigation_row() {
        let thoughts: Vec<_> = (0..12).map(|i| thought(i, &format!("t{i}"), None)).collect();

        let first = list_view(&ListScope::All, &thoughts, 0, 5).keyboard.unwrap();
        let nav = first.rows.last().unwrap();
        assert_eq!(nav.len(), 1);
        assert_eq!(nav[0].callback.encode(), "thoughts_page:1");

        let middle = list_view(&ListScope::All, &thoughts, 1, 5).keyboard.unwrap();
        let nav: Vec<_> = middle.rows.last().unwrap().iter().map(|b| b.callback.encode()).collect();
        assert_eq!(nav, vec!["thoughts_page:0", "thoughts_page:2"]);
    }

    #[test]
    fn test_tag_scope() {
        let thoughts: Vec<_> = (0..6).map(|i| thought(i, "x", Some("work"))).collect();
        let view = list_view(&ListScope::Tag("work".into()), &thoughts, 0, 5);

        assert!(view.text.starts_with("Мысли с тегом _#work_:\n\n"));
        assert!(!view.text.contains("\n_#work_\n"));
        let keyboard = view.keyboard.unwrap();
        let next = keyboard.find(|c| matches!(c, Callback::TagPage { .. })).unwrap();
        assert_eq!(next.callback.encode(), "tag_page:work:1");
    }

    #[test]
    fn test_out_of_range_page_offers_restart() {
        let thoughts = vec![thought(1, "only", None)];
        let view = list_view(&ListScope::All, &thoughts, 3, 5);
        assert_eq!(view.text, labels::PAGE_EMPTY);
        let keyboard = view.keyboard.unwrap();
        assert_eq!(keyboard.rows[0][0].callback, Callback::ThoughtsPage { page: 0 });
    }

    #[test]
    fn test_markdown_escaping() {
        let thoughts = vec![thought(1, "snake_case *bold*", Some("my_tag"))];
        let view = list_view(&ListScope::All, &thoughts, 0, 5);
        assert!(view.text.starts_with("snake\\_case \\*bold\\*"));
        assert!(view.text.ends_with("#my\\_tag"));
    }

    #[test]
    fn test_long_thoughts_fit_one_message() {
        let long = "a_b ".repeat(600);
        let thoughts: Vec<_> = (0..5).map(|i| thought(i, &long, Some("work"))).collect();

        for scope in [ListScope::All, ListScope::Tag("work".into())] {
            let view = list_view(&scope, &thoughts, 0, 5);
            assert!(utf16_len(&view.text) <= MAX_MESSAGE_UNITS);
            assert_eq!(view.text.matches('…').count(), 5);
            assert_eq!(view.text.matches("(📅 2025-02-14)").count(), 5);
            // a cut never leaves a dangling escape
            assert!(!view.text.contains("\\…"));
        }
    }

    #[test]
    fn test_escape_within_budget() {
        assert_eq!(escape_within("short", 10), "short");
        assert_eq!(escape_within("abcdefgh", 5), "abcd…");
        assert_eq!(escape_within("ab_cdef", 4), "ab…");
        assert_eq!(escape_within("ab_cdef", 5), "ab\\_…");
    }

    #[test]
    fn test_tag_picker_layout() {
        let top = vec![
            TagUsage {
                tag: Tag {
                    id: TagId(2),
                    name: "work".into(),
                },
                count: 5,
            },
            TagUsage {
                tag: Tag {
                    id: TagId(9),
                    name: "home".into(),
                },
                count: 0,
            },
        ];
        let keyboard = tag_picker(ThoughtId(11), &top);
        let names: Vec<_> = keyboard.buttons().map(|b| b.label.as_str()).collect();
        assert_eq!(names, vec!["work (5)", "home (0)", labels::ADD_CUSTOM_TAG]);
        assert_eq!(keyboard.rows[0][0].callback.encode(), "tag:11:2");
        assert_eq!(keyboard.rows[2][0].callback.encode(), "custom_tag:11");
    }

    #[test]
    fn test_menus() {
        assert_eq!(
            Menu::Main.rows(),
            vec![vec![labels::MENU_VIEW_THOUGHTS], vec![labels::MENU_ADD_THOUGHT]]
        );
        assert!(Menu::Cancel.one_time());
        assert!(!Menu::Main.one_time());
    }
}
