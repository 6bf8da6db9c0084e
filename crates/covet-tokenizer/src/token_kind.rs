#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TokenKind {
    INLINE_HTML,
    OPEN_TAG,
    OPEN_TAG_WITH_ECHO,
    CLOSE_TAG,

    WHITESPACE,
    COMMENT,
    DOC_COMMENT,

    CONSTANT_ENCAPSED_STRING,
    DOUBLE_QUOTE,
    ENCAPSED_AND_WHITESPACE,
    START_HEREDOC,
    END_HEREDOC,
    BACKQUOTED,

    LEFT_BRACE,
    RIGHT_BRACE,
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACKET,
    RIGHT_BRACKET,
    SEMICOLON,
    COMMA,
    EQ,
    DOUBLE_COLON,
    OBJECT_OPERATOR,
    NS_SEPARATOR,
    OPERATOR,

    NAMESPACE_KW,
    USE_KW,
    TRAIT_KW,
    INTERFACE_KW,
    CLASS_KW,
    EXTENDS_KW,
    AS_KW,
    FUNCTION_KW,
    FINAL_KW,
    ABSTRACT_KW,
    PRIVATE_KW,
    PROTECTED_KW,
    PUBLIC_KW,
    STATIC_KW,

    VARIABLE,
    NAME,
    NUMBER,

    UNKNOWN,
    EOF,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::COMMENT | Self::DOC_COMMENT)
    }

    pub(crate) fn keyword(text: &str) -> Option<Self> {
        const KEYWORDS: [(&str, TokenKind); 14] = [
            ("namespace", TokenKind::NAMESPACE_KW),
            ("use", TokenKind::USE_KW),
            ("trait", TokenKind::TRAIT_KW),
            ("interface", TokenKind::INTERFACE_KW),
            ("class", TokenKind::CLASS_KW),
            ("extends", TokenKind::EXTENDS_KW),
            ("as", TokenKind::AS_KW),
            ("function", TokenKind::FUNCTION_KW),
            ("final", TokenKind::FINAL_KW),
            ("abstract", TokenKind::ABSTRACT_KW),
            ("private", TokenKind::PRIVATE_KW),
            ("protected", TokenKind::PROTECTED_KW),
            ("public", TokenKind::PUBLIC_KW),
            ("static", TokenKind::STATIC_KW),
        ];

        KEYWORDS.iter().find(|(keyword, _)| keyword.eq_ignore_ascii_case(text)).map(|&(_, kind)| kind)
    }
}
