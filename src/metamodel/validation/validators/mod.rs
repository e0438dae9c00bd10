//! The standard metamodel validators.
//!
//! | Priority | Validator                           | Checks                                     |
//! |----------|-------------------------------------|--------------------------------------------|
//! | 200      | [`SupertypeDepthValidator`]         | superclass chains within the depth limit   |
//! | 190      | [`EntityIdentityValidator`]         | application identity has a primary key     |
//! | 180      | [`MixinShapeValidator`]             | a mixin implements exactly its one action  |
//! | 170      | [`TitleRequiredValidator`]          | entities have a title (configurable)       |
//! | 150      | [`MemberOrderSyntaxValidator`]      | member order sequences are well formed     |
//! | 140      | [`ChoicesConflictValidator`]        | no feature has choices and auto-complete   |
//! | 100      | [`OrphanedSupportMethodsValidator`] | support methods matched their member       |

mod members;
mod types;

pub use members::{
    ChoicesConflictValidator, MemberOrderSyntaxValidator, OrphanedSupportMethodsValidator,
};
pub use types::{
    EntityIdentityValidator, MixinShapeValidator, SupertypeDepthValidator, TitleRequiredValidator,
};
