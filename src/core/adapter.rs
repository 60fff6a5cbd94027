//! Known translation libraries, the shape of their hook binding, and
//! recognition of the module the hook is imported from.

use crate::config::TranslationAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingShape {
    /// `const t = useTranslations();`
    Direct,
    /// `const { t } = useTranslation();`
    Destructured,
}

struct KnownAdapter {
    module: &'static str,
    hook: &'static str,
    shape: BindingShape,
}

const KNOWN_ADAPTERS: &[KnownAdapter] = &[
    KnownAdapter {
        module: "next-intl",
        hook: "useTranslations",
        shape: BindingShape::Direct,
    },
    KnownAdapter {
        module: "next-intl/server",
        hook: "getTranslations",
        shape: BindingShape::Direct,
    },
    KnownAdapter {
        module: "react-i18next",
        hook: "useTranslation",
        shape: BindingShape::Destructured,
    },
    KnownAdapter {
        module: "next-i18next",
        hook: "useTranslation",
        shape: BindingShape::Destructured,
    },
    KnownAdapter {
        module: "vue-i18n",
        hook: "useI18n",
        shape: BindingShape::Destructured,
    },
];

/// Path fragments that mark a project-local translation module.
const CUSTOM_MODULE_HINTS: &[&str] = &["i18n", "intl", "translation", "locale"];

pub fn binding_shape(adapter: &TranslationAdapter) -> BindingShape {
    KNOWN_ADAPTERS
        .iter()
        .find(|known| known.module == adapter.module && known.hook == adapter.hook_name)
        .or_else(|| KNOWN_ADAPTERS.iter().find(|known| known.hook == adapter.hook_name))
        .map_or(BindingShape::Direct, |known| known.shape)
}

/// Statement that binds the translation call inside a function body.
pub fn binding_statement(adapter: &TranslationAdapter) -> String {
    match binding_shape(adapter) {
        BindingShape::Direct => format!("const {} = {}();", adapter.call_name, adapter.hook_name),
        BindingShape::Destructured if adapter.call_name == "t" => {
            format!("const {{ t }} = {}();", adapter.hook_name)
        }
        BindingShape::Destructured => {
            format!("const {{ t: {} }} = {}();", adapter.call_name, adapter.hook_name)
        }
    }
}

pub fn import_statement(adapter: &TranslationAdapter) -> String {
    format!("import {{ {} }} from \"{}\";", adapter.hook_name, adapter.module)
}

/// Every hook whose result may already be bound to the call name.
pub fn hook_names(adapter: &TranslationAdapter) -> Vec<&str> {
    let mut names = vec![adapter.hook_name.as_str()];
    for known in KNOWN_ADAPTERS {
        if !names.contains(&known.hook) {
            names.push(known.hook);
        }
    }
    names
}

/// Whether an import source provides the configured hook.
pub fn is_translation_module(source: &str, adapter: &TranslationAdapter) -> bool {
    source == adapter.module
        || KNOWN_ADAPTERS
            .iter()
            .any(|known| known.module == source && known.hook == adapter.hook_name)
        || is_custom_translation_path(source)
}

fn is_custom_translation_path(source: &str) -> bool {
    let local = source.starts_with('.')
        || source.starts_with("@/")
        || source.starts_with("~/")
        || source.starts_with('#');
    if !local {
        return false;
    }
    let last = source.rsplit('/').next().unwrap_or(source);
    let stem = last.split('.').next().unwrap_or(last).to_ascii_lowercase();
    CUSTOM_MODULE_HINTS.iter().any(|hint| stem.contains(hint))
}
