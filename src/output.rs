//! Output binding and rendering.
//!
//! Binding is a pure function from a resolved data source to a named value:
//! the referenced attribute is copied verbatim, with no trimming, type
//! coercion or defaulting. Rendering turns the bound outputs into the
//! formats the CLI prints.

use crate::descriptor::{Descriptor, OutputDecl};
use crate::error::{Error, Result};
use crate::lookup::ResolvedData;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A bound output value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputValue {
    pub value: serde_json::Value,
    pub sensitive: bool,
}

/// Bound outputs in declaration order
pub type Outputs = IndexMap<String, OutputValue>;

/// Bind one output declaration against resolved data.
pub fn bind(decl: &OutputDecl, resolved: &ResolvedData) -> Result<OutputValue> {
    let reference = &decl.value;
    let data = resolved.get(&reference.address).ok_or_else(|| {
        Error::Internal(format!(
            "{} was not resolved before binding outputs",
            reference.address
        ))
    })?;

    let value = data
        .attribute(&reference.attribute, reference.key.as_deref())
        .ok_or_else(|| Error::MissingAttribute {
            address: reference.address.to_string(),
            attribute: match &reference.key {
                Some(key) => format!("{}.{}", reference.attribute, key),
                None => reference.attribute.clone(),
            },
        })?;

    Ok(OutputValue {
        value,
        sensitive: decl.sensitive,
    })
}

/// Bind every output of a descriptor.
pub fn bind_all(descriptor: &Descriptor, resolved: &ResolvedData) -> Result<Outputs> {
    descriptor
        .output
        .iter()
        .map(|(name, decl)| Ok((name.clone(), bind(decl, resolved)?)))
        .collect()
}

// ============================================================================
// Rendering
// ============================================================================

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `name = "value"` lines; sensitive values are masked.
pub fn render_human(outputs: &Outputs) -> String {
    let mut out = String::new();
    for (name, output) in outputs {
        let shown = if output.sensitive {
            "<sensitive>".to_string()
        } else {
            output.value.to_string()
        };
        out.push_str(&format!("{} = {}\n", name, shown));
    }
    out
}

/// `{ "name": { "value": ..., "sensitive": ... } }`
pub fn render_json(outputs: &Outputs) -> Result<String> {
    Ok(serde_json::to_string_pretty(outputs)?)
}

/// The bare value of one output; strings are printed without quotes.
pub fn render_raw(outputs: &Outputs, name: &str) -> Result<String> {
    outputs
        .get(name)
        .map(|output| value_text(&output.value))
        .ok_or_else(|| Error::OutputNotFound(name.to_string()))
}

/// Shell `export` lines, one per output.
pub fn render_exports(outputs: &Outputs) -> String {
    let mut out = String::new();
    for (name, output) in outputs {
        out.push_str(&format!(
            "export {}={}\n",
            env_var_name(name),
            shell_quote(&value_text(&output.value))
        ));
    }
    out
}

/// `default_vpc_id` -> `DEFAULT_VPC_ID`
pub fn env_var_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:@%+,=".contains(c));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DataAddress, Reference};
    use crate::provider::Vpc;
    use pretty_assertions::assert_eq;

    fn resolved(id: &str) -> ResolvedData {
        let mut tags = IndexMap::new();
        tags.insert("Name".to_string(), "it's main".to_string());
        let mut data = ResolvedData::new();
        data.insert(
            DataAddress::new("aws_vpc", "default"),
            Vpc {
                id: id.to_string(),
                arn: String::new(),
                cidr_block: "172.31.0.0/16".to_string(),
                owner_id: "123456789012".to_string(),
                state: "available".to_string(),
                is_default: true,
                dhcp_options_id: None,
                instance_tenancy: None,
                tags,
            },
        );
        data
    }

    fn decl(expr: &str) -> OutputDecl {
        OutputDecl {
            value: Reference::parse(expr).unwrap(),
            description: None,
            sensitive: false,
        }
    }

    #[test]
    fn test_bind_copies_id_verbatim() {
        // Surrounding whitespace in the id is kept as-is.
        let data = resolved(" vpc-0a1b2c3d ");
        let value = bind(&decl("data.aws_vpc.default.id"), &data).unwrap();
        assert_eq!(value.value, serde_json::json!(" vpc-0a1b2c3d "));
        assert!(!value.sensitive);
    }

    #[test]
    fn test_bind_missing_attribute() {
        let err = bind(&decl("data.aws_vpc.default.dhcp_options_id"), &resolved("vpc-1"))
            .unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { .. }));

        let err = bind(&decl("data.aws_vpc.default.tags.Team"), &resolved("vpc-1")).unwrap_err();
        assert!(err.to_string().contains("tags.Team"));
    }

    #[test]
    fn test_bind_unresolved_address_is_internal_error() {
        let err = bind(&decl("data.aws_vpc.other.id"), &resolved("vpc-1")).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_bind_all_canonical() {
        let outputs = bind_all(&Descriptor::canonical(), &resolved("vpc-0a1b2c3d")).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(
            outputs["default_vpc_id"].value,
            serde_json::json!("vpc-0a1b2c3d")
        );
    }

    fn sample_outputs() -> Outputs {
        let mut outputs = Outputs::new();
        outputs.insert(
            "default_vpc_id".to_string(),
            OutputValue {
                value: serde_json::json!("vpc-0a1b2c3d"),
                sensitive: false,
            },
        );
        outputs.insert(
            "vpc_name".to_string(),
            OutputValue {
                value: serde_json::json!("it's main"),
                sensitive: true,
            },
        );
        outputs.insert(
            "is_default".to_string(),
            OutputValue {
                value: serde_json::json!(true),
                sensitive: false,
            },
        );
        outputs
    }

    #[test]
    fn test_render_human() {
        assert_eq!(
            render_human(&sample_outputs()),
            "default_vpc_id = \"vpc-0a1b2c3d\"\nvpc_name = <sensitive>\nis_default = true\n"
        );
    }

    #[test]
    fn test_render_raw() {
        let outputs = sample_outputs();
        assert_eq!(render_raw(&outputs, "default_vpc_id").unwrap(), "vpc-0a1b2c3d");
        assert_eq!(render_raw(&outputs, "is_default").unwrap(), "true");
        assert!(matches!(
            render_raw(&outputs, "missing"),
            Err(Error::OutputNotFound(_))
        ));
    }

    #[test]
    fn test_render_exports() {
        assert_eq!(
            render_exports(&sample_outputs()),
            "export DEFAULT_VPC_ID=vpc-0a1b2c3d\nexport VPC_NAME='it'\\''s main'\nexport IS_DEFAULT=true\n"
        );
    }

    #[test]
    fn test_render_json() {
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&sample_outputs()).unwrap()).unwrap();
        assert_eq!(json["default_vpc_id"]["value"], "vpc-0a1b2c3d");
        assert_eq!(json["vpc_name"]["sensitive"], true);
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(env_var_name("default_vpc_id"), "DEFAULT_VPC_ID");
        assert_eq!(env_var_name("vpc-id"), "VPC_ID");
    }
}
