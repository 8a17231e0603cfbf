//! Closed label enumerations carrying a display name and an external short code.
//!
//! Both [`DialogueActTag`](crate::DialogueActTag) and [`Action`](crate::Action)
//! are generated by [`labelled_enum!`], which gives every member a stable
//! ordinal, a `NAME` and a corpus code, plus a total reverse lookup from code
//! to member.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("\"{code}\" is not a valid {kind} code")]
    UnknownCode { kind: &'static str, code: String },
    #[error("\"{name}\" is not a valid {kind} name")]
    UnknownName { kind: &'static str, name: String },
}

pub type Result<T> = std::result::Result<T, LabelError>;

macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident as $kind:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = ($label:literal, $code:literal)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every member in declaration order. The position of a member in
            /// this slice is its ordinal.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// Number of members, including the `Null` sentinel.
            pub const COUNT: usize = Self::ALL.len();

            /// Upper-case identifier, e.g. `QUESTION_YES_NO`.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Short code used by the annotated corpus, e.g. `qy`.
            #[must_use]
            pub const fn code(self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }

            #[must_use]
            pub const fn ordinal(self) -> usize {
                self as usize
            }

            #[must_use]
            pub fn from_ordinal(ordinal: usize) -> Option<Self> {
                Self::ALL.get(ordinal).copied()
            }

            /// Case-insensitive reverse lookup by code. When two members share
            /// a code the one declared first wins.
            pub fn from_code(code: &str) -> $crate::label::Result<Self> {
                let code = code.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|member| member.code().eq_ignore_ascii_case(code))
                    .ok_or_else(|| $crate::label::LabelError::UnknownCode {
                        kind: $kind,
                        code: code.to_string(),
                    })
            }

            /// Case-insensitive reverse lookup by name.
            pub fn from_name(name: &str) -> $crate::label::Result<Self> {
                let name = name.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|member| member.name().eq_ignore_ascii_case(name))
                    .ok_or_else(|| $crate::label::LabelError::UnknownName {
                        kind: $kind,
                        name: name.to_string(),
                    })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::label::LabelError;

            fn from_str(s: &str) -> $crate::label::Result<Self> {
                Self::from_code(s)
            }
        }
    };
}

pub(crate) use labelled_enum;
