//! Assembly listing (`.pasm`) to module.
//!
//! One statement per line; `;` starts a comment. Directives declare table
//! entries, everything else is an instruction in mnemonic form:
//!
//! ```text
//! .string main "main"
//! .data   shader file:shaders/tri.wgsl
//! .data   clear  hex:00000000
//! .uniform "time" 0 0 f32
//! .animation 10.0 true hold
//! .scene "intro" @main 0.0 10.0
//!
//! create_shader_module 0 $shader
//! define_frame 0 @main
//! draw 3 1 0 0
//! end_frame
//! ```
//!
//! Operands are integers (decimal or `0x` hex), `true`/`false`, `@label` for
//! a string declared with `.string`, a quoted literal for string operands,
//! and `$label` for a data entry declared with `.data`. Labels must be
//! declared before use.

use std::collections::HashMap;
use std::path::Path;

use pngine_core::utils::from_hex;

use super::builder::ModuleBuilder;
use super::codec;
use super::error::EncodeError;
use super::ids::{DataId, StringId};
use super::instructions::{OperandRole, Opcode};
use super::module::{Module, ModuleError};
use super::reflection::{EndBehavior, UniformType};

#[derive(Debug, thiserror::Error)]
pub enum AsmError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("line {line}: unknown directive `.{name}`")]
    UnknownDirective { line: usize, name: String },
    #[error("line {line}: unknown mnemonic `{name}`")]
    UnknownMnemonic { line: usize, name: String },
    #[error("line {line}: undefined label `{label}`")]
    UndefinedLabel { line: usize, label: String },
    #[error("line {line}: label `{label}` already defined")]
    DuplicateLabel { line: usize, label: String },
    #[error("line {line}: {source}")]
    Encode {
        line: usize,
        #[source]
        source: EncodeError,
    },
    #[error("line {line}: cannot read `{path}`: {source}")]
    Include {
        line: usize,
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Module(#[from] ModuleError),
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Word(String),
    Str(String),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Word(w) => format!("`{w}`"),
            Token::Str(s) => format!("string {s:?}"),
        }
    }
}

fn tokenize(line: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == ';' {
            break;
        }
        if c == '"' {
            chars.next();
            tokens.push(Token::Str(read_quoted(&mut chars)?));
            continue;
        }
        let mut word = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() || c == ';' {
                break;
            }
            word.push(c);
            chars.next();
        }
        tokens.push(Token::Word(word));
    }
    Ok(tokens)
}

fn read_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<String, String> {
    let mut out = String::new();
    loop {
        match chars.next() {
            None => return Err("unterminated string literal".into()),
            Some('"') => return Ok(out),
            Some('\\') => match chars.next() {
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('u') => {
                    if chars.next() != Some('{') {
                        return Err("expected `{` after `\\u`".into());
                    }
                    let mut hex = String::new();
                    for c in chars.by_ref() {
                        if c == '}' {
                            break;
                        }
                        hex.push(c);
                    }
                    let ch = u32::from_str_radix(&hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| format!("invalid escape `\\u{{{hex}}}`"))?;
                    out.push(ch);
                }
                Some(other) => return Err(format!("unknown escape `\\{other}`")),
                None => return Err("unterminated string literal".into()),
            },
            Some(c) => out.push(c),
        }
    }
}

fn parse_int(text: &str) -> Option<u32> {
    match text {
        "true" => Some(1),
        "false" => Some(0),
        _ => match text.strip_prefix("0x") {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => text.parse().ok(),
        },
    }
}

/// Assembles listings, resolving `file:` data against an optional base
/// directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct Assembler<'a> {
    base_dir: Option<&'a Path>,
}

/// Assemble a listing that does not include files.
pub fn assemble(source: &str) -> Result<Module, AsmError> {
    Assembler::new().assemble(source)
}

impl<'a> Assembler<'a> {
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    pub fn with_base_dir(mut self, dir: &'a Path) -> Self {
        self.base_dir = Some(dir);
        self
    }

    pub fn assemble(&self, source: &str) -> Result<Module, AsmError> {
        let mut state = State {
            assembler: self,
            builder: ModuleBuilder::new(),
            strings: HashMap::new(),
            data: HashMap::new(),
            line: 0,
        };

        for (idx, line) in source.lines().enumerate() {
            state.line = idx + 1;
            let tokens = tokenize(line).map_err(|message| state.syntax(message))?;
            let Some((head, rest)) = tokens.split_first() else {
                continue;
            };
            match head {
                Token::Word(w) if w.starts_with('.') => state.directive(&w[1..], rest)?,
                Token::Word(w) => state.instruction(w, rest)?,
                Token::Str(_) => return Err(state.syntax("expected a directive or mnemonic")),
            }
        }

        Ok(state.builder.finish()?)
    }
}

struct State<'s, 'a> {
    assembler: &'s Assembler<'a>,
    builder: ModuleBuilder,
    strings: HashMap<String, StringId>,
    data: HashMap<String, DataId>,
    line: usize,
}

impl State<'_, '_> {
    fn syntax(&self, message: impl Into<String>) -> AsmError {
        AsmError::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    fn arity(&self, directive: &str, args: &[Token], n: usize) -> Result<(), AsmError> {
        if args.len() == n {
            Ok(())
        } else {
            Err(self.syntax(format!(
                ".{directive} takes {n} arguments, got {}",
                args.len()
            )))
        }
    }

    fn word<'t>(&self, token: &'t Token, what: &str) -> Result<&'t str, AsmError> {
        match token {
            Token::Word(w) => Ok(w),
            other => Err(self.syntax(format!("expected {what}, found {}", other.describe()))),
        }
    }

    fn label(&self, token: &Token) -> Result<String, AsmError> {
        let w = self.word(token, "a label")?;
        if w.is_empty() || !w.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(self.syntax(format!("invalid label `{w}`")));
        }
        Ok(w.to_owned())
    }

    fn number(&self, token: &Token) -> Result<u32, AsmError> {
        let w = self.word(token, "an integer")?;
        parse_int(w).ok_or_else(|| self.syntax(format!("expected an integer, found `{w}`")))
    }

    fn float(&self, token: &Token) -> Result<f32, AsmError> {
        let w = self.word(token, "a number")?;
        w.parse()
            .map_err(|_| self.syntax(format!("expected a number, found `{w}`")))
    }

    /// `@label` or a quoted literal.
    fn string_ref(&mut self, token: &Token) -> Result<StringId, AsmError> {
        match token {
            Token::Str(s) => Ok(self.builder.intern(s)),
            Token::Word(w) => {
                let Some(label) = w.strip_prefix('@') else {
                    return Err(self.syntax(format!("expected `@label` or a string, found `{w}`")));
                };
                self.strings
                    .get(label)
                    .copied()
                    .ok_or_else(|| AsmError::UndefinedLabel {
                        line: self.line,
                        label: w.clone(),
                    })
            }
        }
    }

    fn data_ref(&self, token: &Token) -> Result<DataId, AsmError> {
        let w = self.word(token, "`$label`")?;
        let Some(label) = w.strip_prefix('$') else {
            return Err(self.syntax(format!("expected `$label`, found `{w}`")));
        };
        self.data
            .get(label)
            .copied()
            .ok_or_else(|| AsmError::UndefinedLabel {
                line: self.line,
                label: w.to_owned(),
            })
    }

    fn directive(&mut self, name: &str, args: &[Token]) -> Result<(), AsmError> {
        match name {
            "string" => {
                self.arity(name, args, 2)?;
                let label = self.label(&args[0])?;
                let Token::Str(text) = &args[1] else {
                    return Err(self.syntax("expected a quoted string"));
                };
                let id = self.builder.intern(text);
                self.define(label, id, |s| &mut s.strings)
            }
            "data" => {
                self.arity(name, args, 2)?;
                let label = self.label(&args[0])?;
                let bytes = self.data_value(&args[1])?;
                let id = self.builder.add_data(bytes);
                self.define(label, id, |s| &mut s.data)
            }
            "wgsl" => {
                self.arity(name, args, 2)?;
                let name = self.string_ref(&args[0])?;
                let data = self.data_ref(&args[1])?;
                self.builder.add_wgsl_entry(name, data);
                Ok(())
            }
            "uniform" => {
                self.arity(name, args, 4)?;
                let field = self.string_ref(&args[0])?;
                let buffer = self.number(&args[1])?;
                let offset = self.number(&args[2])?;
                let ty_name = self.word(&args[3], "a uniform type")?;
                let ty = UniformType::from_name(ty_name)
                    .ok_or_else(|| self.syntax(format!("unknown uniform type `{ty_name}`")))?;
                self.builder.add_uniform_field(field, buffer, offset, ty);
                Ok(())
            }
            "animation" => {
                self.arity(name, args, 3)?;
                let duration = self.float(&args[0])?;
                let looping = self.number(&args[1])? != 0;
                let end_name = self.word(&args[2], "an end behavior")?;
                let end = EndBehavior::from_name(end_name)
                    .ok_or_else(|| self.syntax(format!("unknown end behavior `{end_name}`")))?;
                self.builder.set_animation(duration, looping, end);
                Ok(())
            }
            "scene" => {
                self.arity(name, args, 4)?;
                let scene = self.string_ref(&args[0])?;
                let frame = self.string_ref(&args[1])?;
                let start = self.float(&args[2])?;
                let end = self.float(&args[3])?;
                self.builder.add_scene_entry(scene, frame, start, end);
                Ok(())
            }
            other => Err(AsmError::UnknownDirective {
                line: self.line,
                name: other.to_owned(),
            }),
        }
    }

    fn define<T>(
        &mut self,
        label: String,
        id: T,
        table: impl FnOnce(&mut Self) -> &mut HashMap<String, T>,
    ) -> Result<(), AsmError> {
        let line = self.line;
        let table = table(self);
        if table.contains_key(&label) {
            return Err(AsmError::DuplicateLabel { line, label });
        }
        table.insert(label, id);
        Ok(())
    }

    fn data_value(&self, token: &Token) -> Result<Vec<u8>, AsmError> {
        let w = match token {
            Token::Str(s) => return Ok(s.as_bytes().to_vec()),
            Token::Word(w) => w.as_str(),
        };

        if let Some(hex) = w.strip_prefix("hex:") {
            return from_hex(hex).ok_or_else(|| self.syntax(format!("invalid hex `{hex}`")));
        }
        if let Some(list) = w.strip_prefix("f32:") {
            let mut out = Vec::new();
            for item in list.split(',').filter(|s| !s.is_empty()) {
                let v: f32 = item
                    .parse()
                    .map_err(|_| self.syntax(format!("invalid f32 `{item}`")))?;
                out.extend_from_slice(&v.to_le_bytes());
            }
            return Ok(out);
        }
        if let Some(list) = w.strip_prefix("u32:") {
            let mut out = Vec::new();
            for item in list.split(',').filter(|s| !s.is_empty()) {
                let v = parse_int(item)
                    .ok_or_else(|| self.syntax(format!("invalid u32 `{item}`")))?;
                out.extend_from_slice(&v.to_le_bytes());
            }
            return Ok(out);
        }
        if let Some(path) = w.strip_prefix("file:") {
            let Some(base) = self.assembler.base_dir else {
                return Err(self.syntax("`file:` data needs a base directory"));
            };
            return std::fs::read(base.join(path)).map_err(|source| AsmError::Include {
                line: self.line,
                path: path.to_owned(),
                source,
            });
        }
        Err(self.syntax(format!("invalid data value `{w}`")))
    }

    fn instruction(&mut self, mnemonic: &str, args: &[Token]) -> Result<(), AsmError> {
        let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| AsmError::UnknownMnemonic {
            line: self.line,
            name: mnemonic.to_owned(),
        })?;
        let shape = opcode.operands();
        if args.len() != shape.len() {
            return Err(self.syntax(format!(
                "{mnemonic} takes {} operands, got {}",
                shape.len(),
                args.len()
            )));
        }

        let mut values = Vec::with_capacity(shape.len());
        for (operand, token) in shape.iter().zip(args) {
            let value = match (operand.role, token) {
                (OperandRole::String, Token::Str(_)) => self.string_ref(token)?.get(),
                (OperandRole::String, Token::Word(w)) if w.starts_with('@') => {
                    self.string_ref(token)?.get()
                }
                (OperandRole::Data, Token::Word(w)) if w.starts_with('$') => {
                    self.data_ref(token)?.get()
                }
                _ => self.number(token).map_err(|_| {
                    self.syntax(format!(
                        "operand `{}` of {mnemonic}: unexpected {}",
                        operand.name,
                        token.describe()
                    ))
                })?,
            };
            values.push(value);
        }

        let line = self.line;
        let instr =
            codec::from_values(opcode, &values).map_err(|source| AsmError::Encode { line, source })?;
        self.builder
            .emit(instr)
            .map_err(|source| AsmError::Encode { line, source })?;
        Ok(())
    }
}
