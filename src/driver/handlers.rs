use super::dispatch::{DispatchContext, DispatchError, Flow};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub(super) fn add_preprocessor_symbol<W: Write>(
    ctx: &mut DispatchContext<'_, W>,
    symbol: String,
) -> Result<Flow, DispatchError> {
    debug!(symbol = %symbol, "define");
    ctx.session.add_symbol(&symbol);
    Ok(Flow::Continue)
}

pub(super) fn add_source_file<W: Write>(
    ctx: &mut DispatchContext<'_, W>,
    path: String,
) -> Result<Flow, DispatchError> {
    ctx.session.add_source_file(&PathBuf::from(path), ctx.backend);
    Ok(Flow::Continue)
}

pub(super) fn add_reference<W: Write>(
    ctx: &mut DispatchContext<'_, W>,
    path: String,
) -> Result<Flow, DispatchError> {
    let path = PathBuf::from(path);
    debug!(path = %path.display(), "reference");
    ctx.session.add_reference(path);
    Ok(Flow::Continue)
}

pub(super) fn enable_compatibility_shim<W: Write>(
    ctx: &mut DispatchContext<'_, W>,
) -> Result<Flow, DispatchError> {
    let shim = ctx.env.shim_path.clone();
    if !shim.is_file() {
        // Left in place; emit reports it as a missing reference.
        warn!(path = %shim.display(), "compatibility shim not found next to helper");
    }
    ctx.session.add_compatibility_shim(shim);
    Ok(Flow::Continue)
}

pub(super) fn compile<W: Write>(ctx: &mut DispatchContext<'_, W>) -> Result<Flow, DispatchError> {
    let outcome = ctx.session.compile(ctx.backend)?;
    info!(
        outcome = outcome.label(),
        units = ctx.session.units().len(),
        references = ctx.session.references().len(),
        "compile finished"
    );
    outcome.write_to(ctx.writer)?;
    Ok(Flow::Continue)
}

pub(super) fn finish<W: Write>(_ctx: &mut DispatchContext<'_, W>) -> Result<Flow, DispatchError> {
    Ok(Flow::Stop)
}
