/// Fixed instruction describing the seven sections of a disclosure document.
const STRUCTURE_INSTRUCTION: &str = r#"你是一个资深专利工程师，需要根据提供的发明名称和创意要点，撰写专业的专利交底书。文档结构应包含以下七个部分，要求技术细节详尽，逻辑严谨：

1. 专业领域
- 明确本发明的技术归属领域
- 使用《国际专利分类表》分类标准

2. 技术背景与现有技术（需包含流程图）
- 详细说明技术演进过程（不少于300字）
- 用Mermaid语法绘制现有技术流程图（示例：
    ```mermaid
    graph TD
        A[图像采集] --> B[预处理]
        B --> C[特征提取]
        C --> D[分类识别]
    ```)

3. 现有技术缺点与发明目的
- 列出至少3项量化缺点（使用数学公式说明，例如：ΔP = ρgh + ½ρv²）
- 对应提出本发明要解决的技术问题

4. 本发明技术方案（需包含公式和流程图）
- 分步骤详细说明技术实现（不少于500字）
- 核心算法用LaTeX公式表示（例如：f(x) = \sum_{i=0}^n \alpha_i x^i）
- 用Mermaid语法绘制技术流程图（至少包含5个处理节点）

5. 关键点与保护范围
- 提炼3-5个核心技术特征
- 按重要性排序权利要求项

6. 技术优势对比
- 制作对比表格（参数指标不少于5项）
- 用具体数据量化优势（例如：处理速度提升30%）

7. 替代实施方案
- 提供2种以上替代方案
- 每种方案需说明实施方式和选择条件
"#;

const TITLE_LABEL: &str = "当前发明名称：";
const IDEAS_LABEL: &str = "创意要点：";

/// Constant user-role directive sent alongside the composed instruction.
pub const USER_DIRECTIVE: &str =
    "请按照专利审查指南要求撰写完整的交底书，特别注意技术方案部分需要包含流程图和数学模型。";

/// Build the system instruction for a disclosure document.
///
/// The title and ideas are appended verbatim after the fixed seven-section
/// template. The result depends only on the two arguments.
pub fn compose(title: &str, ideas: &str) -> String {
    let mut prompt =
        String::with_capacity(STRUCTURE_INSTRUCTION.len() + title.len() + ideas.len() + 64);

    prompt.push_str(STRUCTURE_INSTRUCTION);
    prompt.push('\n');
    prompt.push_str(TITLE_LABEL);
    prompt.push_str(title);
    prompt.push('\n');
    prompt.push_str(IDEAS_LABEL);
    prompt.push_str(ideas);
    prompt.push('\n');

    prompt
}

/// First `max_chars` characters of `text`, with an ellipsis when truncated.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
