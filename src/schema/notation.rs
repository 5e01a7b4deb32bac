//! GraphQL-style type notation: `Name`, `Name!`, `[T]`, `[T]!`.
use super::TypeRef;
use crate::error::SchemaError;

/// Parse `notation`, turning each named type into a `TypeRef` via `named`.
pub fn parse_type<F>(notation: &str, named: F) -> Result<TypeRef, SchemaError>
where
    F: Fn(&str) -> TypeRef,
{
    let mut parser = Parser { src: notation, rest: notation.trim(), named: &named };
    let ty = parser.ty()?;
    if !parser.rest.is_empty() {
        return Err(parser.fail("unexpected trailing input"));
    }
    Ok(ty)
}

struct Parser<'a, F> {
    src: &'a str,
    rest: &'a str,
    named: &'a F,
}

impl<'a, F> Parser<'a, F>
where
    F: Fn(&str) -> TypeRef,
{
    fn ty(&mut self) -> Result<TypeRef, SchemaError> {
        let inner = if let Some(rest) = self.rest.strip_prefix('[') {
            self.rest = rest.trim_start();
            let item = self.ty()?;
            match self.rest.strip_prefix(']') {
                Some(rest) => self.rest = rest.trim_start(),
                None => return Err(self.fail("missing `]`")),
            }
            TypeRef::list_of(item)
        } else {
            let end = self.rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(self.rest.len());
            let name = &self.rest[..end];
            if name.is_empty() {
                return Err(self.fail("expected a type name"));
            }
            if name.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(self.fail("type names cannot start with a digit"));
            }
            self.rest = self.rest[end..].trim_start();
            (self.named)(name)
        };

        if let Some(rest) = self.rest.strip_prefix('!') {
            self.rest = rest.trim_start();
            if self.rest.starts_with('!') {
                return Err(self.fail("duplicate `!`"));
            }
            return Ok(TypeRef::non_null(inner));
        }
        Ok(inner)
    }

    fn fail(&self, reason: &'static str) -> SchemaError {
        SchemaError::Notation { notation: self.src.to_owned(), reason }
    }
}
