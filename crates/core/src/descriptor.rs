//! Conversions between JVM internal names/descriptors and their external (Java source) form.
//!
//! The model stores everything in internal form (`com/example/Foo`,
//! `(Ljava/lang/String;I)V`). Mapping files use external form
//! (`com.example.Foo`, `void m(java.lang.String,int)`).

use obscura_utils::errors::DescriptorError;

/// Returns true if the descriptor is a method descriptor.
pub fn is_method(descriptor: &str) -> bool {
    descriptor.starts_with('(')
}

/// Converts `com/example/Foo` to `com.example.Foo`.
pub fn external_class_name(internal: &str) -> String {
    internal.replace('/', ".")
}

/// Converts `com.example.Foo` to `com/example/Foo`.
pub fn internal_class_name(external: &str) -> String {
    external.replace('.', "/")
}

/// Returns the package prefix of an internal class name, including the trailing `/`.
///
/// ```
/// use obscura_core::descriptor::package_prefix;
///
/// assert_eq!(package_prefix("com/example/Foo"), "com/example/");
/// assert_eq!(package_prefix("Foo"), "");
/// ```
pub fn package_prefix(internal: &str) -> &str {
    match internal.rfind('/') {
        Some(index) => &internal[..=index],
        None => "",
    }
}

/// Returns the parent of a package prefix (`a/b/` → `a/`, `a/` → ``).
pub fn parent_package_prefix(prefix: &str) -> &str {
    let trimmed = prefix.strip_suffix('/').unwrap_or(prefix);
    package_prefix(trimmed)
}

/// Returns the simple name of an internal class name, without its package.
pub fn simple_name(internal: &str) -> &str {
    match internal.rfind('/') {
        Some(index) => &internal[index + 1..],
        None => internal,
    }
}

/// Returns the index just past the field type that starts at `start`.
fn field_type_end(descriptor: &str, start: usize) -> Result<usize, DescriptorError> {
    let bytes = descriptor.as_bytes();
    let mut index = start;
    while index < bytes.len() && bytes[index] == b'[' {
        index += 1;
    }
    match bytes.get(index) {
        None => Err(DescriptorError::UnexpectedEnd(descriptor.to_string())),
        Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b'V') => Ok(index + 1),
        Some(b'L') => match descriptor[index..].find(';') {
            Some(offset) => Ok(index + offset + 1),
            None => Err(DescriptorError::MissingSemicolon(descriptor.to_string())),
        },
        Some(&other) => Err(DescriptorError::InvalidChar {
            descriptor: descriptor.to_string(),
            ch: other as char,
            index,
        }),
    }
}

/// Splits a method descriptor into its parameter descriptors and return descriptor.
///
/// ```
/// use obscura_core::descriptor::split_method;
///
/// let (params, ret) = split_method("(ILjava/lang/String;[J)V").unwrap();
/// assert_eq!(params, vec!["I", "Ljava/lang/String;", "[J"]);
/// assert_eq!(ret, "V");
/// ```
pub fn split_method(descriptor: &str) -> Result<(Vec<&str>, &str), DescriptorError> {
    if !is_method(descriptor) {
        return Err(DescriptorError::InvalidChar {
            descriptor: descriptor.to_string(),
            ch: descriptor.chars().next().unwrap_or('?'),
            index: 0,
        });
    }
    let mut params = Vec::new();
    let mut index = 1;
    loop {
        match descriptor.as_bytes().get(index) {
            None => return Err(DescriptorError::UnexpectedEnd(descriptor.to_string())),
            Some(b')') => break,
            Some(_) => {
                let end = field_type_end(descriptor, index)?;
                params.push(&descriptor[index..end]);
                index = end;
            }
        }
    }
    let ret = &descriptor[index + 1..];
    if field_type_end(descriptor, index + 1)? != descriptor.len() {
        return Err(DescriptorError::InvalidChar {
            descriptor: descriptor.to_string(),
            ch: ')',
            index,
        });
    }
    Ok((params, ret))
}

/// Converts a single field type descriptor to its external type name.
pub fn to_external_type(descriptor: &str) -> Result<String, DescriptorError> {
    let dims = descriptor.bytes().take_while(|&b| b == b'[').count();
    let element = &descriptor[dims..];
    let mut name = match element {
        "B" => "byte".to_string(),
        "C" => "char".to_string(),
        "D" => "double".to_string(),
        "F" => "float".to_string(),
        "I" => "int".to_string(),
        "J" => "long".to_string(),
        "S" => "short".to_string(),
        "Z" => "boolean".to_string(),
        "V" => "void".to_string(),
        _ => {
            let class = element
                .strip_prefix('L')
                .and_then(|rest| rest.strip_suffix(';'))
                .ok_or_else(|| DescriptorError::MissingSemicolon(descriptor.to_string()))?;
            external_class_name(class)
        }
    };
    for _ in 0..dims {
        name.push_str("[]");
    }
    Ok(name)
}

/// Converts an external type name (`int[]`, `java.lang.String`) to a field type descriptor.
pub fn from_external_type(name: &str) -> Result<String, DescriptorError> {
    let name = name.trim();
    let mut element = name;
    let mut dims = 0;
    while let Some(stripped) = element.strip_suffix("[]") {
        element = stripped;
        dims += 1;
    }
    if element.is_empty() {
        return Err(DescriptorError::EmptyType);
    }
    let mut descriptor = "[".repeat(dims);
    match element {
        "byte" => descriptor.push('B'),
        "char" => descriptor.push('C'),
        "double" => descriptor.push('D'),
        "float" => descriptor.push('F'),
        "int" => descriptor.push('I'),
        "long" => descriptor.push('J'),
        "short" => descriptor.push('S'),
        "boolean" => descriptor.push('Z'),
        "void" => descriptor.push('V'),
        class => {
            descriptor.push('L');
            descriptor.push_str(&internal_class_name(class));
            descriptor.push(';');
        }
    }
    Ok(descriptor)
}

/// Builds a method descriptor from external parameter and return type names.
pub fn method_from_external<S: AsRef<str>>(
    params: &[S],
    ret: &str,
) -> Result<String, DescriptorError> {
    let mut descriptor = String::from("(");
    for param in params {
        descriptor.push_str(&from_external_type(param.as_ref())?);
    }
    descriptor.push(')');
    descriptor.push_str(&from_external_type(ret)?);
    Ok(descriptor)
}

/// Splits a method descriptor into external parameter names and the external return type.
pub fn method_to_external(descriptor: &str) -> Result<(Vec<String>, String), DescriptorError> {
    let (params, ret) = split_method(descriptor)?;
    let params = params
        .into_iter()
        .map(to_external_type)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((params, to_external_type(ret)?))
}

/// Returns the class named by the return type of a method descriptor, if any.
pub fn return_class(descriptor: &str) -> Option<&str> {
    let (_, ret) = split_method(descriptor).ok()?;
    ret.strip_prefix('L')?.strip_suffix(';')
}

/// Rewrites every class name inside a field or method descriptor.
///
/// `map` returns the new internal name for a class, or `None` to leave it unchanged.
pub fn map_classes<F>(descriptor: &str, map: F) -> Result<String, DescriptorError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(descriptor.len());
    let mut chars = descriptor.char_indices();
    while let Some((index, ch)) = chars.next() {
        out.push(ch);
        if ch != 'L' {
            continue;
        }
        let rest = &descriptor[index + 1..];
        let end = rest
            .find(';')
            .ok_or_else(|| DescriptorError::MissingSemicolon(descriptor.to_string()))?;
        let class = &rest[..end];
        match map(class) {
            Some(renamed) => out.push_str(&renamed),
            None => out.push_str(class),
        }
        out.push(';');
        // Skip the class name and its terminator.
        for _ in 0..=class.chars().count() {
            chars.next();
        }
    }
    Ok(out)
}

/// Returns the part of a descriptor that distinguishes overloads in one name space.
///
/// With aggressive overloading the full descriptor is used, so methods that differ
/// only in their return type and fields that differ only in their type may share a
/// name. Otherwise methods are keyed by their argument list and all fields share
/// one key.
///
/// ```
/// use obscura_core::descriptor::overload_key;
///
/// assert_eq!(overload_key("(I)V", false), "(I)");
/// assert_eq!(overload_key("I", false), "");
/// assert_eq!(overload_key("(I)V", true), "(I)V");
/// ```
pub fn overload_key(descriptor: &str, aggressive: bool) -> &str {
    if aggressive {
        return descriptor;
    }
    match descriptor.find(')') {
        Some(index) => &descriptor[..=index],
        None => "",
    }
}
