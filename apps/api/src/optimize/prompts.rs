// Prompt constants for the text-optimization endpoint.

/// System instruction for polishing a shop description.
/// Replace: {plain_text_only}
pub const OPTIMIZE_SYSTEM_TEMPLATE: &str = "你是一个文本优化助手，你的任务是优化用户输入的店铺介绍文本，\
    使其更加清晰易读，同时保留所有原始信息。{plain_text_only}";
