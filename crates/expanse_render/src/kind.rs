//! The table of component kinds the interpreter understands.
//!
//! Kind strings are matched ignoring case, `-` and `_`, so `FOR_EACH`,
//! `for-each` and `ForEach` all name the same kind.

use core::fmt;

/// A recognized component kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Renders `then`/children or `else` depending on a condition.
    Conditional,
    /// Renders the first matching case.
    Switch,
    /// A branch of a [`Kind::Switch`].
    Case,
    /// The fallback branch of a [`Kind::Switch`].
    Default,
    /// Renders its body once per item.
    ForEach,
    /// A pure layout container.
    Layout(LayoutKind),
    /// A multi-step flow with a cursor kept in state.
    Wizard,
    /// Writes a value to state when it changes. Renders nothing.
    SetVar,
    /// Renders a dump of the context, state and props.
    Debug,
    /// A display or input component.
    Leaf(LeafKind),
}

impl Kind {
    /// Parses a kind string.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let kind = match normalized.as_str() {
            "CONDITIONAL" | "CONDITION" | "IF" => Self::Conditional,
            "SWITCH" => Self::Switch,
            "CASE" => Self::Case,
            "DEFAULT" => Self::Default,
            "FOREACH" | "REPEAT" => Self::ForEach,
            "WIZARD" => Self::Wizard,
            "SETVAR" => Self::SetVar,
            "DEBUG" => Self::Debug,
            other => {
                return LayoutKind::parse(other)
                    .map(Self::Layout)
                    .or_else(|| LeafKind::parse(other).map(Self::Leaf));
            }
        };
        Some(kind)
    }
}

/// Layout containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// Block flow.
    Block,
    /// CSS-grid style.
    Grid,
    /// Flex container.
    Flex,
    /// Plain box.
    Box,
    /// Vertical stack.
    Column,
    /// Horizontal stack.
    Row,
}

impl LayoutKind {
    fn parse(normalized: &str) -> Option<Self> {
        Some(match normalized {
            "BLOCK" => Self::Block,
            "GRID" => Self::Grid,
            "FLEX" => Self::Flex,
            "BOX" => Self::Box,
            "COLUMN" | "COL" => Self::Column,
            "ROW" => Self::Row,
            _ => return None,
        })
    }

    /// Returns the canonical name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Block => "BLOCK",
            Self::Grid => "GRID",
            Self::Flex => "FLEX",
            Self::Box => "BOX",
            Self::Column => "COLUMN",
            Self::Row => "ROW",
        }
    }
}

macro_rules! leaf_kinds {
    ($($variant:ident => $name:literal $(| $alias:literal)*),+ $(,)?) => {
        /// Display and input components.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum LeafKind {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl LeafKind {
            fn parse(normalized: &str) -> Option<Self> {
                match normalized {
                    $(
                        n if n == $name.replace('_', "") $(|| n == $alias)* => Some(Self::$variant),
                    )+
                    _ => None,
                }
            }

            /// Returns the canonical name.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }
    };
}

leaf_kinds! {
    Button => "BUTTON",
    ImageButton => "IMAGE_BUTTON",
    Text => "TEXT",
    Heading => "HEADING",
    Label => "LABEL",
    Link => "LINK",
    Input => "INPUT",
    Textarea => "TEXTAREA",
    Select => "SELECT",
    Checkbox => "CHECKBOX",
    Toggle => "TOGGLE",
    Slider => "SLIDER",
    DatePicker => "DATE_PICKER",
    FileUpload => "FILE_UPLOAD",
    Badge => "BADGE",
    Progress => "PROGRESS",
    Avatar => "AVATAR",
    Alert => "ALERT",
    Markdown => "MARKDOWN",
    DataTable => "DATA_TABLE" | "TABLE",
    CodeBlock => "CODE_BLOCK" | "CODE",
    Divider => "DIVIDER" | "SEPARATOR",
    Spacer => "SPACER",
    Iframe => "IFRAME",
    Image => "IMAGE" | "IMG",
    Icon => "ICON",
    Card => "CARD",
    List => "LIST",
}

impl LeafKind {
    /// Returns `true` for kinds that take user input and honor `bindTo`.
    #[must_use]
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Self::Input
                | Self::Textarea
                | Self::Select
                | Self::Checkbox
                | Self::Toggle
                | Self::Slider
                | Self::DatePicker
                | Self::FileUpload
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Conditional => "CONDITIONAL",
            Self::Switch => "SWITCH",
            Self::Case => "CASE",
            Self::Default => "DEFAULT",
            Self::ForEach => "FOR_EACH",
            Self::Layout(layout) => layout.as_str(),
            Self::Wizard => "WIZARD",
            Self::SetVar => "SET_VAR",
            Self::Debug => "DEBUG",
            Self::Leaf(leaf) => leaf.as_str(),
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spelling_variants_are_equivalent() {
        for raw in ["FOR_EACH", "for-each", "ForEach", "foreach", "REPEAT"] {
            assert_eq!(Kind::parse(raw), Some(Kind::ForEach), "{raw}");
        }
        assert_eq!(
            Kind::parse("date-picker"),
            Some(Kind::Leaf(LeafKind::DatePicker))
        );
        assert_eq!(Kind::parse("set_var"), Some(Kind::SetVar));
    }

    #[test]
    fn aliases_resolve() {
        assert_eq!(Kind::parse("table"), Some(Kind::Leaf(LeafKind::DataTable)));
        assert_eq!(Kind::parse("Col"), Some(Kind::Layout(LayoutKind::Column)));
        assert_eq!(Kind::parse("condition"), Some(Kind::Conditional));
    }

    #[test]
    fn unknown_kinds_are_none() {
        assert_eq!(Kind::parse("HOLOGRAM"), None);
        assert_eq!(Kind::parse(""), None);
    }

    #[test]
    fn input_kinds() {
        assert!(LeafKind::Toggle.is_input());
        assert!(!LeafKind::Button.is_input());
    }

    #[test]
    fn display_uses_canonical_names() {
        assert_eq!(Kind::Leaf(LeafKind::CodeBlock).to_string(), "CODE_BLOCK");
        assert_eq!(Kind::ForEach.to_string(), "FOR_EACH");
    }
}
