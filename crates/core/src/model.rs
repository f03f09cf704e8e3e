/// Module for the in-memory symbol model the rename engine operates on.
///
/// Classes live in an arena (`ClassPool`) and are addressed by `ClassId`. Members are
/// addressed by their owning class and their declaration index (`MemberId`). Superclass
/// and interface links are resolved once, when the pool is built; a supertype that is not
/// part of the pool stays an explicit `TypeLink::External` instead of a dangling edge.
///
/// All names are kept in JVM internal form (`com/example/Foo`) and are never changed in
/// place: renaming fills `new_name` (and `new_descriptor` for members), and the reference
/// rewriter updates the constant pool.
use obscura_utils::errors::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const CONSTRUCTOR: &str = "<init>";
pub const STATIC_INITIALIZER: &str = "<clinit>";

/// Index of a class in its `ClassPool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

impl ClassId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A member, identified by its declaring class and declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId {
    pub class: ClassId,
    pub index: u32,
}

/// Access level of a class or member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    #[default]
    Package,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Field,
    Method,
}

/// A field or method declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub kind: MemberKind,
    pub name: String,
    pub descriptor: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_abstract: bool,
    /// First and last source line of a method body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<(u32, u32)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_names: Vec<String>,
    #[serde(default)]
    pub kept: bool,
    #[serde(default)]
    pub parameters_kept: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_descriptor: Option<String>,
}

impl Member {
    fn new(kind: MemberKind, name: &str, descriptor: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            visibility: Visibility::Package,
            is_static: false,
            is_abstract: false,
            lines: None,
            parameter_names: Vec::new(),
            kept: false,
            parameters_kept: false,
            new_name: None,
            new_descriptor: None,
        }
    }

    pub fn field(name: &str, descriptor: &str) -> Self {
        Self::new(MemberKind::Field, name, descriptor)
    }

    pub fn method(name: &str, descriptor: &str) -> Self {
        Self::new(MemberKind::Method, name, descriptor)
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn public(self) -> Self {
        self.with_visibility(Visibility::Public)
    }

    pub fn protected(self) -> Self {
        self.with_visibility(Visibility::Protected)
    }

    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn with_lines(mut self, first: u32, last: u32) -> Self {
        self.lines = Some((first, last));
        self
    }

    pub fn with_parameters(mut self, names: &[&str]) -> Self {
        self.parameter_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn is_field(&self) -> bool {
        self.kind == MemberKind::Field
    }

    pub fn is_method(&self) -> bool {
        self.kind == MemberKind::Method
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    /// `<init>` and `<clinit>` can never be renamed.
    pub fn is_initializer(&self) -> bool {
        self.name == CONSTRUCTOR || self.name == STATIC_INITIALIZER
    }

    /// Name after renaming, or the original name if none was assigned.
    pub fn final_name(&self) -> &str {
        self.new_name.as_deref().unwrap_or(&self.name)
    }

    /// Descriptor after reference rewriting, or the original descriptor.
    pub fn final_descriptor(&self) -> &str {
        self.new_descriptor.as_deref().unwrap_or(&self.descriptor)
    }

    /// True if the member was given a name different from its original one.
    pub fn is_renamed(&self) -> bool {
        self.new_name.as_deref().is_some_and(|n| n != self.name)
    }
}

/// A symbolic reference in a class's constant pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constant {
    Class {
        name: String,
    },
    FieldRef {
        owner: String,
        name: String,
        descriptor: String,
    },
    MethodRef {
        owner: String,
        name: String,
        descriptor: String,
        #[serde(default)]
        interface: bool,
    },
    /// A synthetic call site; `name` is the functional interface method name and the
    /// descriptor's return type is the functional interface.
    InvokeDynamic {
        name: String,
        descriptor: String,
    },
    MethodType {
        descriptor: String,
    },
    String {
        value: String,
    },
}

/// A resolved or unresolved supertype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeLink {
    Resolved(ClassId),
    /// A supertype that is neither a program nor a library class.
    External(String),
}

impl TypeLink {
    pub const fn resolved(&self) -> Option<ClassId> {
        match self {
            Self::Resolved(id) => Some(*id),
            Self::External(_) => None,
        }
    }
}

/// A class declaration with its members and constant pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassNode {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_interface: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default, rename = "superclass", skip_serializing_if = "Option::is_none")]
    pub super_name: Option<String>,
    #[serde(default, rename = "interfaces", skip_serializing_if = "Vec::is_empty")]
    pub interface_names: Vec<String>,
    /// Enclosing class of an inner class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constants: Vec<Constant>,
    #[serde(default)]
    pub library: bool,
    #[serde(default)]
    pub kept: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(skip)]
    pub superclass: Option<TypeLink>,
    #[serde(skip)]
    pub interfaces: Vec<TypeLink>,
    #[serde(skip)]
    pub outer: Option<ClassId>,
}

impl ClassNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            visibility: Visibility::Public,
            is_interface: false,
            is_abstract: false,
            super_name: None,
            interface_names: Vec::new(),
            outer_class: None,
            source_file: None,
            members: Vec::new(),
            constants: Vec::new(),
            library: false,
            kept: false,
            new_name: None,
            superclass: None,
            interfaces: Vec::new(),
            outer: None,
        }
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.super_name = Some(superclass.to_string());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interface_names.push(interface.to_string());
        self
    }

    pub fn interface(mut self) -> Self {
        self.is_interface = true;
        self.is_abstract = true;
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn inner_of(mut self, outer: &str) -> Self {
        self.outer_class = Some(outer.to_string());
        self
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_constant(mut self, constant: Constant) -> Self {
        self.constants.push(constant);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn package_prefix(&self) -> &str {
        crate::descriptor::package_prefix(&self.name)
    }

    pub fn final_name(&self) -> &str {
        self.new_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_renamed(&self) -> bool {
        self.new_name.as_deref().is_some_and(|n| n != self.name)
    }

    /// Resolved and unresolved direct supertypes, superclass first.
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeLink> {
        self.superclass.iter().chain(self.interfaces.iter())
    }

    /// Finds a declared member by name and descriptor.
    pub fn find_member(&self, name: &str, descriptor: &str) -> Option<usize> {
        self.members
            .iter()
            .position(|m| m.name == name && m.descriptor == descriptor)
    }
}

#[derive(Serialize, Deserialize)]
struct PoolDocument {
    classes: Vec<ClassNode>,
}

/// Arena of program and library classes with resolved hierarchy links.
#[derive(Debug, Clone, Default)]
pub struct ClassPool {
    classes: Vec<ClassNode>,
    by_name: HashMap<String, ClassId>,
}

impl ClassPool {
    /// Builds a pool from program and library classes and resolves their links.
    ///
    /// Library classes are marked immutable. When a name occurs twice, the first
    /// declaration wins; program classes are inserted before library classes.
    pub fn new(program: Vec<ClassNode>, library: Vec<ClassNode>) -> Self {
        let mut pool = Self::default();
        let program = program.into_iter().map(|c| (c, false));
        let library = library.into_iter().map(|c| (c, true));
        for (mut class, is_library) in program.chain(library) {
            if pool.by_name.contains_key(&class.name) {
                tracing::debug!("Skipping duplicate class {}", class.name);
                continue;
            }
            class.library = is_library;
            let id = ClassId(pool.classes.len() as u32);
            pool.by_name.insert(class.name.clone(), id);
            pool.classes.push(class);
        }
        pool.resolve();
        pool
    }

    /// Resolves superclass, interface and outer-class names into arena links.
    pub fn resolve(&mut self) {
        let link = |name: &String, by_name: &HashMap<String, ClassId>| match by_name.get(name) {
            Some(id) => TypeLink::Resolved(*id),
            None => TypeLink::External(name.clone()),
        };
        for class in &mut self.classes {
            class.superclass = class.super_name.as_ref().map(|n| link(n, &self.by_name));
            class.interfaces = class
                .interface_names
                .iter()
                .map(|n| link(n, &self.by_name))
                .collect();
            class.outer = class
                .outer_class
                .as_ref()
                .and_then(|n| self.by_name.get(n).copied());
        }
    }

    /// Reads the class list of a JSON model document (`{"classes": [...]}`).
    pub fn read_document(path: impl AsRef<Path>) -> Result<Vec<ClassNode>, ModelError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ModelError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_document(&text)
    }

    pub fn parse_document(text: &str) -> Result<Vec<ClassNode>, ModelError> {
        let document: PoolDocument = serde_json::from_str(text)?;
        Ok(document.classes)
    }

    /// Serializes the program classes (library classes are left out).
    pub fn program_document(&self) -> Result<String, ModelError> {
        let document = PoolDocument {
            classes: self.classes.iter().filter(|c| !c.library).cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len() as u32).map(ClassId)
    }

    pub fn program_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.ids().filter(|id| !self.classes[id.index()].library)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassNode> {
        self.classes.iter()
    }

    pub fn get(&self, id: ClassId) -> &ClassNode {
        &self.classes[id.index()]
    }

    pub fn get_mut(&mut self, id: ClassId) -> &mut ClassNode {
        &mut self.classes[id.index()]
    }

    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn member(&self, id: MemberId) -> &Member {
        &self.classes[id.class.index()].members[id.index as usize]
    }

    pub fn member_mut(&mut self, id: MemberId) -> &mut Member {
        &mut self.classes[id.class.index()].members[id.index as usize]
    }

    /// Ids of the members declared by a class, in declaration order.
    pub fn member_ids(&self, class: ClassId) -> impl Iterator<Item = MemberId> {
        let count = self.classes[class.index()].members.len() as u32;
        (0..count).map(move |index| MemberId { class, index })
    }

    /// Total number of members across all classes.
    pub fn member_count(&self) -> usize {
        self.classes.iter().map(|c| c.members.len()).sum()
    }
}
