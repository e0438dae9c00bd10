//! Method naming conventions shared by member discovery and the support-method factories.

use crate::metamodel::reflect::{MethodDescriptor, TypeRef};

pub(crate) const GET_PREFIX: &str = "get";
pub(crate) const IS_PREFIX: &str = "is";
pub(crate) const SET_PREFIX: &str = "set";
pub(crate) const CLEAR_PREFIX: &str = "clear";
pub(crate) const ADD_TO_PREFIX: &str = "addTo";
pub(crate) const REMOVE_FROM_PREFIX: &str = "removeFrom";
pub(crate) const HIDE_PREFIX: &str = "hide";
pub(crate) const DISABLE_PREFIX: &str = "disable";
pub(crate) const VALIDATE_PREFIX: &str = "validate";
pub(crate) const CHOICES_PREFIX: &str = "choices";
pub(crate) const DEFAULT_PREFIX: &str = "default";
pub(crate) const AUTO_COMPLETE_PREFIX: &str = "autoComplete";

pub(crate) const TITLE_METHOD: &str = "title";
pub(crate) const ICON_NAME_METHOD: &str = "iconName";

/// Prefixes of methods that configure another member; longest prefixes first so that
/// `removeFrom` is not mistaken for something shorter.
pub(crate) const SUPPORT_PREFIXES: [&str; 10] = [
    AUTO_COMPLETE_PREFIX,
    REMOVE_FROM_PREFIX,
    VALIDATE_PREFIX,
    DISABLE_PREFIX,
    CHOICES_PREFIX,
    DEFAULT_PREFIX,
    ADD_TO_PREFIX,
    CLEAR_PREFIX,
    HIDE_PREFIX,
    SET_PREFIX,
];

/// A method name decomposed as `<prefix><N?><Target>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SupportTarget<'a> {
    pub prefix: &'static str,
    pub parameter: Option<usize>,
    pub member: String,
    pub raw: &'a str,
}

/// `Name` for `name`
pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `name` for `Name`; an all-caps acronym prefix such as `URL` is kept as is
pub(crate) fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => {
            name.to_string()
        }
        (Some(first), _) => first
            .to_lowercase()
            .chain(name.chars().skip(1))
            .collect(),
        (None, _) => String::new(),
    }
}

/// The remainder of `name` after `prefix`, if it continues with an uppercase letter
fn strip_convention<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(prefix)?;
    rest.chars()
        .next()
        .filter(|c| c.is_uppercase())
        .map(|_| rest)
}

/// Property or collection name for an accessor method, if `method` follows the
/// `getXxx()` / `isXxx()` convention
pub(crate) fn accessor_name(method: &MethodDescriptor) -> Option<String> {
    if method.param_count() != 0 || method.return_type.is_void() {
        return None;
    }

    if let Some(rest) = strip_convention(&method.name, GET_PREFIX) {
        return Some(decapitalize(rest));
    }

    if method.return_type.is_boolean() {
        if let Some(rest) = strip_convention(&method.name, IS_PREFIX) {
            return Some(decapitalize(rest));
        }
    }

    None
}

/// Returns true if `return_type` makes an accessor a collection rather than a property
pub(crate) fn is_collection_accessor(return_type: &TypeRef) -> bool {
    return_type.is_collection()
}

/// Decomposes `name` as a support method name, e.g. `choices0PlaceOrder` into
/// (`choices`, `Some(0)`, `placeOrder`)
pub(crate) fn support_target(name: &str) -> Option<SupportTarget<'_>> {
    for prefix in SUPPORT_PREFIXES {
        let Some(rest) = name.strip_prefix(prefix) else {
            continue;
        };

        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        let (parameter, member) = if digits > 0 {
            (rest[..digits].parse::<usize>().ok(), &rest[digits..])
        } else {
            (None, rest)
        };

        if member.chars().next().is_some_and(char::is_uppercase) {
            return Some(SupportTarget {
                prefix,
                parameter,
                member: decapitalize(member),
                raw: name,
            });
        }
    }
    None
}

/// `<prefix><Member>`
pub(crate) fn support_method_name(prefix: &str, member: &str) -> String {
    format!("{prefix}{}", capitalize(member))
}

/// `<prefix><index><Action>`
pub(crate) fn param_support_method_name(prefix: &str, index: usize, action: &str) -> String {
    format!("{prefix}{index}{}", capitalize(action))
}

/// Human readable name inferred from a member id, e.g. `Place Order` for `placeOrder`
pub(crate) fn natural_name(member: &str) -> String {
    let mut natural = String::with_capacity(member.len() + 4);
    let mut previous_lower = false;
    for (i, c) in member.chars().enumerate() {
        if i == 0 {
            natural.extend(c.to_uppercase());
        } else {
            if c.is_uppercase() && previous_lower {
                natural.push(' ');
            }
            natural.push(c);
        }
        previous_lower = c.is_lowercase() || c.is_ascii_digit();
    }
    natural
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::reflect::MethodBuilder;

    #[test]
    fn test_capitalization() {
        assert_eq!(capitalize("name"), "Name");
        assert_eq!(decapitalize("Name"), "name");
        assert_eq!(decapitalize("URL"), "URL");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_accessor_name() {
        let getter = MethodBuilder::new("getFirstName")
            .returns(TypeRef::value("String"))
            .build_method();
        let flag = MethodBuilder::new("isActive")
            .returns(TypeRef::value("boolean"))
            .build_method();
        let not_bool = MethodBuilder::new("isActive")
            .returns(TypeRef::value("String"))
            .build_method();
        let void = MethodBuilder::new("getNothing").build_method();
        let lowercase = MethodBuilder::new("getaway")
            .returns(TypeRef::value("String"))
            .build_method();

        assert_eq!(accessor_name(&getter).as_deref(), Some("firstName"));
        assert_eq!(accessor_name(&flag).as_deref(), Some("active"));
        assert_eq!(accessor_name(&not_bool), None);
        assert_eq!(accessor_name(&void), None);
        assert_eq!(accessor_name(&lowercase), None);
    }

    #[test]
    fn test_support_target() {
        let target = support_target("choices0PlaceOrder").unwrap();
        assert_eq!(target.prefix, CHOICES_PREFIX);
        assert_eq!(target.parameter, Some(0));
        assert_eq!(target.member, "placeOrder");

        let target = support_target("removeFromLines").unwrap();
        assert_eq!(target.prefix, REMOVE_FROM_PREFIX);
        assert_eq!(target.member, "lines");

        let target = support_target("autoCompleteCustomer").unwrap();
        assert_eq!(target.prefix, AUTO_COMPLETE_PREFIX);

        assert!(support_target("settle").is_none());
        assert!(support_target("placeOrder").is_none());
    }

    #[test]
    fn test_support_method_names() {
        assert_eq!(support_method_name(HIDE_PREFIX, "name"), "hideName");
        assert_eq!(
            param_support_method_name(DEFAULT_PREFIX, 1, "placeOrder"),
            "default1PlaceOrder"
        );
    }

    #[test]
    fn test_natural_name() {
        assert_eq!(natural_name("placeOrder"), "Place Order");
        assert_eq!(natural_name("name"), "Name");
        assert_eq!(natural_name("line2Total"), "Line2 Total");
    }
}
