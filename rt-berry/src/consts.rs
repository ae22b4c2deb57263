//! 通用常量.

/// 二值结构掩膜的体素取值.
pub mod mask {
    /// 掩膜中背景的体素值.
    pub const BACKGROUND: u8 = 0;

    /// 掩膜中前景 (结构内部) 的体素值.
    pub const FOREGROUND: u8 = 1;

    /// 体素是否是前景?
    ///
    /// 读入的掩膜可能使用非 1 的正值表示前景, 因此这里按 "非零" 判断.
    #[inline]
    pub const fn is_foreground(p: u8) -> bool {
        p != BACKGROUND
    }

    /// 体素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, BACKGROUND)
    }

    /// 将任意 `u8` 体素值规范化为 `{BACKGROUND, FOREGROUND}`.
    #[inline]
    pub const fn binarize(p: u8) -> u8 {
        if is_foreground(p) {
            FOREGROUND
        } else {
            BACKGROUND
        }
    }
}

/// 结构名配置中的特殊记号.
pub mod names {
    /// 真值结构列表中的通配符, 表示接受所有结构.
    pub const WILDCARD: &str = "*";

    /// 真值结构列表中的豁免前缀. 带该前缀的结构会被接受, 但不参与互斥.
    pub const EXEMPT_PREFIX: char = '+';

    /// 结构运算表达式 (如 `a.minus.b`) 的分隔符.
    pub const OPERATION_SEP: char = '.';

    /// 重命名规则中旧名与新名之间的分隔符.
    pub const MAPPING_SEP: char = ':';

    /// 重命名规则中多个旧名之间的分隔符.
    pub const OLD_NAME_SEP: char = ',';

    /// 重命名规则中表示 "增广" 的新名前缀.
    pub const AUGMENT_PREFIX: char = '+';
}
