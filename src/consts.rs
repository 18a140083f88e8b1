// Runtime ABI names shared by the injectors and the reference interpreter

// Default internal name of the argument bundle class handlers are compiled against
pub const ARGS_CLASS: &str = "org/spongepowered/asm/mixin/injection/invoke/arg/Args";

// Bundle methods called from synthesized code
pub const ARGS_FACTORY: &str = "of";
pub const ARGS_SET_DESC: &str = "setDesc";
pub const ARGS_PUSH: &str = "push";
pub const ARGS_GET: &str = "get";
pub const ARGS_GET_DESC: &str = "(I)Ljava/lang/Object;";

// Bundle methods only handlers call
pub const ARGS_SET: &str = "set";
pub const ARGS_SIZE: &str = "size";

pub const OBJECT_CLASS: &str = "java/lang/Object";
pub const STRING_CLASS: &str = "java/lang/String";

// Reference types a java/lang/String is assignable to
pub const STRING_SUPERTYPES: &[&str] = &[
    "java/lang/String", "java/lang/Object", "java/lang/CharSequence",
    "java/lang/Comparable", "java/io/Serializable",
];

// Extra reference types every boxed primitive is assignable to
pub const BOXED_SUPERTYPES: &[&str] = &[
    "java/lang/Object", "java/lang/Comparable", "java/io/Serializable",
];

pub const NUMBER_CLASS: &str = "java/lang/Number";

// Static wrapper method boxing a primitive
pub const BOX_METHOD: &str = "valueOf";

// Name injectors report themselves under
pub const MODIFY_ARGS: &str = "@ModifyArgs";
