//! Implementation of the `stackweave catalog` command.

use stackweave_adapters::BuiltinStore;
use stackweave_core::{
    application::{CatalogService, FragmentInfo},
    domain::{DocumentKind, FragmentId},
    error::Context,
};

use crate::{
    cli::{CatalogArgs, Document, ListFormat},
    error::CliResult,
    output::OutputManager,
};

pub fn execute(args: CatalogArgs, output: OutputManager) -> CliResult<()> {
    let store = Box::new(BuiltinStore::with_builtin()?);
    let service = CatalogService::new(store);

    if let Some(id) = &args.id {
        let fragment = service.get(&FragmentId::from(id.as_str()))?;
        return show_fragment(&fragment, args.format, &output);
    }

    let fragments = service.list(args.document.map(convert_document))?;

    match args.format {
        ListFormat::Table => {
            output.header("Catalog fragments:")?;
            for f in &fragments {
                output.data(&format!(
                    "  {:<28} {:<26} {}",
                    f.id,
                    f.document.as_str(),
                    f.applies_when
                ))?;
            }
        }
        ListFormat::List => {
            for f in &fragments {
                output.data(&f.id)?;
            }
        }
        ListFormat::Json => {
            let json = serde_json::to_string_pretty(&fragments).context("serializing catalog")?;
            output.data(&json)?;
        }
        ListFormat::Csv => {
            output.data("id,document,applies_when,specificity")?;
            for f in &fragments {
                output.data(&format!(
                    "{},{},{},{}",
                    f.id,
                    f.document.as_str(),
                    f.applies_when,
                    f.specificity
                ))?;
            }
        }
    }

    Ok(())
}

fn show_fragment(f: &FragmentInfo, format: ListFormat, output: &OutputManager) -> CliResult<()> {
    match format {
        ListFormat::Json => {
            let json = serde_json::to_string_pretty(f).context("serializing fragment")?;
            output.data(&json)?;
        }
        ListFormat::List | ListFormat::Csv => output.data(&f.id)?,
        ListFormat::Table => {
            output.header(&f.id)?;
            if !f.description.is_empty() {
                output.data(&format!("  {}", f.description))?;
            }
            output.data(&format!("  document:     {}", f.document))?;
            output.data(&format!("  applies when: {}", f.applies_when))?;
            output.data(&format!("  provides:     {}", join_or_dash(&f.provides)))?;
            output.data(&format!("  requires:     {}", join_or_dash(&f.requires)))?;
        }
    }
    Ok(())
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".into()
    } else {
        items.join(", ")
    }
}

fn convert_document(doc: Document) -> DocumentKind {
    match doc {
        Document::Build => DocumentKind::BuildDescriptor,
        Document::Orchestration => DocumentKind::OrchestrationDescriptor,
        Document::Ignore => DocumentKind::IgnoreList,
        Document::Env => DocumentKind::EnvTemplate,
    }
}
