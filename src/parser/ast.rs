//! Syntax tree types for the layer document format

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Root AST node - a complete layer document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub statements: Vec<Spanned<Statement>>,
}

impl Document {
    /// Canvas declarations in source order
    pub fn canvases(&self) -> impl Iterator<Item = &Spanned<Statement>> {
        self.statements
            .iter()
            .filter(|s| matches!(s.node, Statement::Canvas(_)))
    }

    /// Root layer declarations in paint order
    pub fn layers(&self) -> impl Iterator<Item = &LayerDecl> {
        self.statements.iter().filter_map(|s| match &s.node {
            Statement::Layer(layer) => Some(layer),
            Statement::Canvas(_) => None,
        })
    }
}

/// Top-level statement in a document
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Canvas declaration: `canvas [width: 800, height: 600]`
    Canvas(CanvasDecl),
    /// Any layer, groups included
    Layer(LayerDecl),
}

/// Canvas size and background
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasDecl {
    pub modifiers: Vec<Spanned<Modifier>>,
}

/// A layer declaration of any kind
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDecl {
    pub name: Spanned<String>,
    pub body: LayerBody,
    pub modifiers: Vec<Spanned<Modifier>>,
    /// Span of the whole declaration
    pub span: Span,
}

/// Kind-specific part of a layer declaration
#[derive(Debug, Clone, PartialEq)]
pub enum LayerBody {
    /// `group "name" { ... }`
    Group { children: Vec<LayerDecl> },
    /// `text "name" "content"`
    Text { content: Spanned<String> },
    /// `placed "name" "source"?` - replaceable embedded bitmap
    Placed { source: Option<Spanned<String>> },
    /// `pixels "name" "source"` - plain raster
    Pixels { source: Spanned<String> },
    /// `fill "name"` - solid color shape
    Fill,
}

impl LayerBody {
    /// Keyword used to declare this kind of layer
    pub fn keyword(&self) -> &'static str {
        match self {
            LayerBody::Group { .. } => "group",
            LayerBody::Text { .. } => "text",
            LayerBody::Placed { .. } => "placed",
            LayerBody::Pixels { .. } => "pixels",
            LayerBody::Fill => "fill",
        }
    }
}

/// `key: value` inside a modifier block
#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    pub key: Spanned<String>,
    pub value: Spanned<Value>,
}

/// Modifier values
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    String(String),
    /// Hex color as written, including the leading `#`
    Color(String),
    /// Bare word such as `ellipse`, `multiply` or `true`
    Keyword(String),
}

impl Value {
    /// Short description used in error messages
    pub fn describe(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Color(_) => "color",
            Value::Keyword(_) => "keyword",
        }
    }
}
