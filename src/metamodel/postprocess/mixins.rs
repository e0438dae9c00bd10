use std::sync::Arc;

use tracing::trace;

use crate::{
    metamodel::{
        facets::{Contributed, FacetType, MixinFacet, NotContributedFacet, NotContributedFacetImpl},
        postprocess::{PostProcessContext, PostProcessor},
        spec::{ObjectMemberRc, ObjectSpecification},
    },
    Result,
};

/// The mixin facet of `spec` and the action implementing it, if both exist
fn mixin_action(spec: &ObjectSpecification) -> Option<(Arc<dyn MixinFacet>, ObjectMemberRc)> {
    let mixin = spec.holder().get_facet::<dyn MixinFacet>()?;
    let action = spec
        .declared_members()
        .iter()
        .find(|m| m.is_action() && m.id() == mixin.method_name())?
        .clone();
    Some((mixin, action))
}

/// Contributes mixin actions to their target types.
///
/// A mixin action without an explicit `NotContributedFacet` gets a derived one contributing
/// it both as action and as association. A target collects the contributions of every mixin
/// in the metamodel; a mixin loaded after the barrier contributes to its already sealed
/// target directly.
pub struct MixinContributions;

impl PostProcessor for MixinContributions {
    fn name(&self) -> &'static str {
        "MixinContributions"
    }

    fn priority(&self) -> u32 {
        200
    }

    fn post_process(&self, spec: &ObjectSpecification, ctx: &PostProcessContext<'_>) -> Result<()> {
        if let Some((mixin, action)) = mixin_action(spec) {
            if !action.holder().contains_facet::<dyn NotContributedFacet>() {
                action
                    .holder()
                    .add_facet::<dyn NotContributedFacet>(Arc::new(
                        NotContributedFacetImpl::derived(
                            action.identifier(),
                            Contributed::AsBoth,
                            FacetType::of::<dyn MixinFacet>(),
                        ),
                    ))?;
            }

            match ctx.find(mixin.target()) {
                Some(target) if target.is_sealed() => target.add_contributed_action(action),
                Some(_) => {}
                None => trace!(mixin = %spec.name(), target = %mixin.target(), "mixin target not loaded"),
            }
        }

        for other in ctx.specifications() {
            if let Some((mixin, action)) = mixin_action(other) {
                if mixin.target() == spec.name() {
                    spec.add_contributed_action(action);
                }
            }
        }
        Ok(())
    }
}
