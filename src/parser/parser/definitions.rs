use crate::error::Result;
use crate::parser::lexer::token::TokenKind;
use crate::parser::parser::Session;
use crate::reflect::modifiers;
use crate::reflect::{
    AliasRule, EntityKind, LazySlot, PrecedenceRule, ReflectionClass, ReflectionFunction,
    ReflectionMethod, ReflectionParameter, ReflectionProperty, TypeHint,
};
use crate::value::Value;
use indexmap::IndexMap;
use std::path::Path;
use std::rc::Rc;

impl Session<'_> {
    /// `[abstract|final] class Name [extends Parent] [implements I, ...] { ... }`
    pub(super) fn class_declaration(&mut self) -> Result<()> {
        let doc = self.cursor.doc_comment();

        let mut class_modifiers = 0u32;
        loop {
            match self.cursor.kind() {
                TokenKind::Abstract => {
                    if class_modifiers & modifiers::CLASS_EXPLICIT_ABSTRACT != 0 {
                        return Err(self
                            .cursor
                            .error("Multiple abstract modifiers are not allowed"));
                    }
                    if class_modifiers & modifiers::CLASS_FINAL != 0 {
                        return Err(self
                            .cursor
                            .error("Cannot use the final modifier on an abstract class"));
                    }
                    class_modifiers |= modifiers::CLASS_EXPLICIT_ABSTRACT;
                    self.cursor.advance();
                }
                TokenKind::Final => {
                    if class_modifiers & modifiers::CLASS_FINAL != 0 {
                        return Err(self.cursor.error("Multiple final modifiers are not allowed"));
                    }
                    if class_modifiers & modifiers::CLASS_EXPLICIT_ABSTRACT != 0 {
                        return Err(self
                            .cursor
                            .error("Cannot use the final modifier on an abstract class"));
                    }
                    class_modifiers |= modifiers::CLASS_FINAL;
                    self.cursor.advance();
                }
                _ => break,
            }
        }

        self.cursor.expect(TokenKind::Class)?;
        let name = self.cursor.expect(TokenKind::Identifier)?;
        let fqn = self.prefix_namespace(&name);

        let parent = if self.cursor.eat(TokenKind::Extends) {
            Some(self.qualified_name()?)
        } else {
            None
        };

        let mut interfaces = Vec::new();
        if self.cursor.eat(TokenKind::Implements) {
            loop {
                let interface = self.qualified_name()?;
                if !interfaces.contains(&interface) {
                    interfaces.push(interface);
                }
                if !self.cursor.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        let mut class = ReflectionClass::new(
            EntityKind::Class,
            fqn.clone(),
            self.cursor.filename().map(Path::to_path_buf),
            doc,
            class_modifiers,
            interfaces,
            parent,
        );

        self.class_name = fqn.clone();
        let body = self.class_body(&mut class);
        self.class_name.clear();
        body?;

        self.classes.insert(fqn, Rc::new(class));
        Ok(())
    }

    /// `interface Name [extends I, ...] { ... }`
    pub(super) fn interface_declaration(&mut self) -> Result<()> {
        let doc = self.cursor.doc_comment();
        self.cursor.expect(TokenKind::Interface)?;
        let name = self.cursor.expect(TokenKind::Identifier)?;
        let fqn = self.prefix_namespace(&name);

        let mut interfaces = Vec::new();
        if self.cursor.eat(TokenKind::Extends) {
            loop {
                let interface = self.qualified_name()?;
                if !interfaces.contains(&interface) {
                    interfaces.push(interface);
                }
                if !self.cursor.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        let mut class = ReflectionClass::new(
            EntityKind::Interface,
            fqn.clone(),
            self.cursor.filename().map(Path::to_path_buf),
            doc,
            0,
            interfaces,
            None,
        );

        self.class_name = fqn.clone();
        let body = self.class_body(&mut class);
        self.class_name.clear();
        body?;

        self.classes.insert(fqn, Rc::new(class));
        Ok(())
    }

    /// `trait Name { ... }`
    pub(super) fn trait_declaration(&mut self) -> Result<()> {
        let doc = self.cursor.doc_comment();
        self.cursor.expect(TokenKind::Trait)?;
        let name = self.cursor.expect(TokenKind::Identifier)?;
        let fqn = self.prefix_namespace(&name);

        let mut class = ReflectionClass::new(
            EntityKind::Trait,
            fqn.clone(),
            self.cursor.filename().map(Path::to_path_buf),
            doc,
            0,
            Vec::new(),
            None,
        );

        self.class_name = fqn.clone();
        self.trait_name = fqn.clone();
        let body = self.class_body(&mut class);
        self.class_name.clear();
        self.trait_name.clear();
        body?;

        self.classes.insert(fqn, Rc::new(class));
        Ok(())
    }

    /// `function [&] name (params) { ... }` at the top level.
    pub(super) fn function_declaration(&mut self) -> Result<()> {
        let doc = self.cursor.doc_comment();
        self.cursor.expect(TokenKind::Function)?;
        let returns_reference = self.cursor.eat(TokenKind::Ampersand);
        let name = self.cursor.expect(TokenKind::Identifier)?;
        let fqn = self.prefix_namespace(&name);

        self.function_name = fqn.clone();
        self.method_name = fqn.clone();

        let mut function = ReflectionFunction::new(fqn.clone(), doc, returns_reference);
        function.set_parameters(self.parameter_list(&fqn)?);
        function.set_static_variables(self.function_body()?);

        self.function_name.clear();
        self.method_name.clear();

        self.functions.insert(fqn, Rc::new(function));
        Ok(())
    }

    fn class_body(&mut self, class: &mut ReflectionClass) -> Result<()> {
        self.cursor.expect(TokenKind::OpenBrace)?;
        while !self.cursor.at_eof() && self.cursor.kind() != TokenKind::CloseBrace {
            let doc = self.cursor.doc_comment();
            match self.cursor.kind() {
                TokenKind::Const => self.class_constants(class)?,
                TokenKind::Use => self.trait_use(class)?,
                _ => {
                    let member_modifiers = self.member_modifiers()?;
                    match self.cursor.kind() {
                        TokenKind::Function => self.class_method(class, doc, member_modifiers)?,
                        TokenKind::Variable => {
                            self.class_properties(class, doc, member_modifiers)?
                        }
                        _ => return Err(self.cursor.expected("class member declaration")),
                    }
                }
            }
        }
        self.cursor.expect(TokenKind::CloseBrace)?;
        Ok(())
    }

    /// A run of member modifiers; each category may occur once, and a member
    /// cannot be both abstract and final.
    fn member_modifiers(&mut self) -> Result<u32> {
        let mut mods = 0u32;
        loop {
            let bit = match self.cursor.kind() {
                TokenKind::Public => modifiers::PUBLIC,
                TokenKind::Protected => modifiers::PROTECTED,
                TokenKind::Private => modifiers::PRIVATE,
                TokenKind::Static => modifiers::STATIC,
                TokenKind::Abstract => modifiers::ABSTRACT,
                TokenKind::Final => modifiers::FINAL,
                _ => return Ok(mods),
            };
            if bit & modifiers::ACCESS_MASK != 0 && mods & modifiers::ACCESS_MASK != 0 {
                return Err(self
                    .cursor
                    .error("Multiple access type modifiers are not allowed"));
            }
            if mods & bit != 0 {
                let which = self.cursor.text();
                return Err(self
                    .cursor
                    .error(format!("Multiple {} modifiers are not allowed", which)));
            }
            if (bit == modifiers::ABSTRACT && mods & modifiers::FINAL != 0)
                || (bit == modifiers::FINAL && mods & modifiers::ABSTRACT != 0)
            {
                return Err(self
                    .cursor
                    .error("Cannot use the final modifier on an abstract class member"));
            }
            mods |= bit;
            self.cursor.advance();
        }
    }

    /// `const A = expr [, B = expr]* ;`
    fn class_constants(&mut self, class: &mut ReflectionClass) -> Result<()> {
        self.cursor.expect(TokenKind::Const)?;
        loop {
            let name = self.cursor.expect(TokenKind::Identifier)?;
            self.cursor.expect(TokenKind::Eq)?;
            let value = self.scalar_expression()?;
            class.add_constant(name, value);
            if !self.cursor.eat(TokenKind::Comma) {
                break;
            }
        }
        self.cursor.expect(TokenKind::SemiColon)?;
        Ok(())
    }

    /// A comma-separated property list sharing one modifier set and doc
    /// comment.
    fn class_properties(
        &mut self,
        class: &mut ReflectionClass,
        doc: Option<String>,
        mut property_modifiers: u32,
    ) -> Result<()> {
        if property_modifiers & modifiers::ABSTRACT != 0 {
            return Err(self.cursor.error("Properties cannot be declared abstract"));
        }
        if property_modifiers & modifiers::FINAL != 0 {
            return Err(self.cursor.error("Properties cannot be declared final"));
        }
        if property_modifiers & modifiers::ACCESS_MASK == 0 {
            property_modifiers |= modifiers::PUBLIC;
        }

        loop {
            let variable = self.cursor.expect(TokenKind::Variable)?;
            let name = variable.trim_start_matches('$').to_string();
            let (has_default, default) = if self.cursor.eat(TokenKind::Eq) {
                (true, Some(LazySlot::new(self.scalar_expression()?)))
            } else {
                (false, None)
            };
            class.add_property(ReflectionProperty::new(
                self.class_name.clone(),
                doc.clone(),
                property_modifiers,
                name,
                has_default,
                default,
            ));
            if !self.cursor.eat(TokenKind::Comma) {
                break;
            }
        }
        self.cursor.expect(TokenKind::SemiColon)?;
        Ok(())
    }

    fn class_method(
        &mut self,
        class: &mut ReflectionClass,
        doc: Option<String>,
        mut method_modifiers: u32,
    ) -> Result<()> {
        if method_modifiers & modifiers::ACCESS_MASK == 0 {
            method_modifiers |= modifiers::PUBLIC;
        }

        self.cursor.expect(TokenKind::Function)?;
        let returns_reference = self.cursor.eat(TokenKind::Ampersand);
        let name = self.cursor.expect(TokenKind::Identifier)?;
        let qualified = format!("{}::{}", self.class_name, name);

        self.method_name = qualified.clone();
        self.function_name = name.clone();

        let mut method = ReflectionMethod::new(
            self.class_name.clone(),
            doc,
            method_modifiers,
            returns_reference,
            name,
        );
        method.set_parameters(self.parameter_list(&qualified)?);

        if method_modifiers & modifiers::ABSTRACT != 0 || class.is_interface() {
            if self.cursor.kind() == TokenKind::OpenBrace {
                return Err(self
                    .cursor
                    .error(format!("Abstract function {}() cannot contain body", qualified)));
            }
            self.cursor.expect(TokenKind::SemiColon)?;
        } else {
            if self.cursor.kind() == TokenKind::SemiColon {
                return Err(self.cursor.error(format!(
                    "Non-abstract method {}() must contain body",
                    qualified
                )));
            }
            method.set_static_variables(self.function_body()?);
        }

        self.method_name.clear();
        self.function_name.clear();

        class.add_method(method);
        Ok(())
    }

    /// `use A [, B]* ;` or `use A, B { adaptations }` inside a class body.
    fn trait_use(&mut self, class: &mut ReflectionClass) -> Result<()> {
        self.cursor.expect(TokenKind::Use)?;
        loop {
            let name = self.qualified_name()?;
            class.add_trait_name(name);
            if !self.cursor.eat(TokenKind::Comma) {
                break;
            }
        }

        if !self.cursor.eat(TokenKind::OpenBrace) {
            self.cursor.expect(TokenKind::SemiColon)?;
            return Ok(());
        }

        while !self.cursor.at_eof() && self.cursor.kind() != TokenKind::CloseBrace {
            // `Trait::method ...` vs a bare `method ...` reference.
            let qualified = self.cursor.kind() == TokenKind::NsSeparator
                || self.cursor.kind() == TokenKind::Namespace
                || (self.cursor.kind() == TokenKind::Identifier
                    && self
                        .cursor
                        .lookahead_skipping(&[TokenKind::Identifier, TokenKind::NsSeparator])
                        == TokenKind::DoubleColon);

            let (trait_name, method) = if qualified {
                let trait_name = self.qualified_name()?;
                self.cursor.expect(TokenKind::DoubleColon)?;
                (Some(trait_name), self.cursor.expect(TokenKind::Identifier)?)
            } else {
                (None, self.cursor.expect(TokenKind::Identifier)?)
            };

            match self.cursor.kind() {
                TokenKind::Insteadof => {
                    self.cursor.advance();
                    let Some(owner) = trait_name else {
                        return Err(self
                            .cursor
                            .error("A precedence rule requires a Trait::method reference"));
                    };
                    let mut instead_of = Vec::new();
                    loop {
                        instead_of.push(self.qualified_name()?);
                        if !self.cursor.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.cursor.expect(TokenKind::SemiColon)?;
                    class.add_precedence_rule(PrecedenceRule {
                        trait_name: owner,
                        method,
                        instead_of,
                    });
                }
                TokenKind::As => {
                    self.cursor.advance();
                    let visibility = match self.cursor.kind() {
                        TokenKind::Public => Some(modifiers::PUBLIC),
                        TokenKind::Protected => Some(modifiers::PROTECTED),
                        TokenKind::Private => Some(modifiers::PRIVATE),
                        _ => None,
                    };
                    if visibility.is_some() {
                        self.cursor.advance();
                    }
                    let alias = self.cursor.opt(TokenKind::Identifier);
                    if visibility.is_none() && alias.is_none() {
                        return Err(self.cursor.expected("visibility modifier or alias name"));
                    }
                    self.cursor.expect(TokenKind::SemiColon)?;
                    class.add_alias_rule(AliasRule {
                        trait_name,
                        method,
                        visibility,
                        alias,
                    });
                }
                _ => return Err(self.cursor.expected("'insteadof' or 'as'")),
            }
        }
        self.cursor.expect(TokenKind::CloseBrace)?;
        Ok(())
    }

    /// `( [type] [&] [...] $name [= default] , ... )`
    fn parameter_list(&mut self, owner: &str) -> Result<Vec<Rc<ReflectionParameter>>> {
        self.cursor.expect(TokenKind::OpenParen)?;
        let mut parameters: Vec<Rc<ReflectionParameter>> = Vec::new();

        while self.cursor.kind() != TokenKind::CloseParen {
            let type_hint = match self.cursor.kind() {
                TokenKind::Array => {
                    self.cursor.advance();
                    Some(TypeHint::Array)
                }
                TokenKind::TypeCallable => {
                    self.cursor.advance();
                    Some(TypeHint::Callable)
                }
                TokenKind::Identifier | TokenKind::NsSeparator | TokenKind::Namespace => {
                    Some(TypeHint::ClassName(self.qualified_name()?))
                }
                _ => None,
            };

            let by_reference = self.cursor.eat(TokenKind::Ampersand);
            let variadic = self.cursor.eat(TokenKind::Ellipsis);
            let variable = self.cursor.expect(TokenKind::Variable)?;
            let name = variable.trim_start_matches('$').to_string();

            let mut default_constant = None;
            let (has_default, default) = if self.cursor.eat(TokenKind::Eq) {
                // A bare constant name as the whole default keeps its
                // symbolic spelling for callers that want it.
                if self.cursor.kind() == TokenKind::Identifier
                    && matches!(
                        self.cursor.lookahead_skipping(&[]),
                        TokenKind::Comma | TokenKind::CloseParen
                    )
                {
                    default_constant = Some(self.cursor.text());
                }
                (true, Some(LazySlot::new(self.scalar_expression()?)))
            } else {
                (false, None)
            };

            parameters.push(Rc::new(ReflectionParameter::new(
                owner.to_string(),
                parameters.len(),
                type_hint,
                by_reference,
                variadic,
                name,
                has_default,
                default,
                default_constant,
            )));

            if !self.cursor.eat(TokenKind::Comma) {
                break;
            }
        }

        self.cursor.expect(TokenKind::CloseParen)?;
        Ok(parameters)
    }

    /// Skips a brace-balanced function body, capturing `static $var`
    /// declarations found at statement-start position.
    fn function_body(&mut self) -> Result<IndexMap<String, LazySlot>> {
        self.cursor.expect(TokenKind::OpenBrace)?;
        let mut statics = IndexMap::new();
        let mut depth = 1usize;
        let mut statement_start = true;

        while depth > 0 {
            match self.cursor.kind() {
                TokenKind::Eof => return Err(self.cursor.expected("'}'")),
                TokenKind::OpenBrace => {
                    depth += 1;
                    statement_start = true;
                    self.cursor.advance();
                }
                TokenKind::CloseBrace => {
                    depth -= 1;
                    statement_start = true;
                    self.cursor.advance();
                }
                TokenKind::SemiColon => {
                    statement_start = true;
                    self.cursor.advance();
                }
                TokenKind::Static
                    if statement_start
                        && self.cursor.lookahead_skipping(&[]) == TokenKind::Variable =>
                {
                    self.static_variables(&mut statics)?;
                }
                _ => {
                    statement_start = false;
                    self.cursor.advance();
                }
            }
        }

        Ok(statics)
    }

    /// `static $a [= expr] [, $b [= expr]]* ;`
    fn static_variables(&mut self, statics: &mut IndexMap<String, LazySlot>) -> Result<()> {
        self.cursor.expect(TokenKind::Static)?;
        loop {
            let variable = self.cursor.expect(TokenKind::Variable)?;
            let name = variable.trim_start_matches('$').to_string();
            let slot = if self.cursor.eat(TokenKind::Eq) {
                LazySlot::new(self.scalar_expression()?)
            } else {
                LazySlot::from_value(Value::Null)
            };
            statics.insert(name, slot);
            if !self.cursor.eat(TokenKind::Comma) {
                break;
            }
        }
        self.cursor.expect(TokenKind::SemiColon)?;
        Ok(())
    }
}
