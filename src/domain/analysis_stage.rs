use serde::Deserialize;

/// One step of the sequential analysis pipeline. `instructions` may reference
/// `{query}` and `{file_path}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisStage {
    pub name: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub instructions: String,
    pub expected_output: String,
    #[serde(default)]
    pub web_search: bool,
}

impl AnalysisStage {
    pub fn render_instructions(&self, query: &str, file_path: &str) -> String {
        self.instructions
            .replace("{query}", query)
            .replace("{file_path}", file_path)
    }

    pub fn render_goal(&self, query: &str) -> String {
        self.goal.replace("{query}", query)
    }

    /// Verification, financial analysis, investment analysis, risk assessment.
    pub fn default_pipeline() -> Vec<AnalysisStage> {
        vec![
            AnalysisStage {
                name: "verification".to_string(),
                role: "Financial Document Verifier".to_string(),
                goal: "Verify whether the uploaded file is a valid financial document and ensure relevant financial content exists.".to_string(),
                backstory: "You specialize in identifying financial disclosures, earnings data, balance sheet elements, and operational metrics. You ensure that analysis is performed only on relevant financial information.".to_string(),
                instructions: "Verify whether the uploaded document at {file_path} is a financial report.\n\nCheck for:\n- Financial statements\n- Revenue data\n- Profitability indicators\n- Market disclosures\n\nConfirm whether meaningful financial data exists for analysis.".to_string(),
                expected_output: "State whether the document is a valid financial document suitable for analysis.".to_string(),
                web_search: false,
            },
            AnalysisStage {
                name: "financial_analysis".to_string(),
                role: "Senior Financial Analyst".to_string(),
                goal: "Analyze financial documents and provide accurate, data-driven investment insights based on real financial metrics: {query}".to_string(),
                backstory: "You are a seasoned financial analyst with expertise in corporate financial statements, earnings reports, and macroeconomic indicators. Your insights are grounded in factual financial data and realistic market understanding.".to_string(),
                instructions: "Analyze the financial document located at {file_path}.\n\nProvide:\n1. Company financial summary\n2. Revenue and profitability insights\n3. Balance sheet strength\n4. Cash flow outlook\n5. Growth indicators\n\nAnswer the user's query: {query}".to_string(),
                expected_output: "A structured financial analysis including key financial highlights, trends observed and business performance insights.".to_string(),
                web_search: false,
            },
            AnalysisStage {
                name: "investment_analysis".to_string(),
                role: "Investment Strategist".to_string(),
                goal: "Provide balanced investment recommendations based on financial health and market outlook.".to_string(),
                backstory: "You analyze company fundamentals to suggest realistic investment strategies. You consider growth prospects, risk exposure, competitive positioning, and macro trends.".to_string(),
                instructions: "Based on the analyzed financial data from {file_path}, evaluate investment attractiveness.\n\nConsider:\n- Financial health\n- Growth potential\n- Market positioning\n- Profitability trends\n\nProvide a realistic investment outlook.".to_string(),
                expected_output: "Investment strengths, weaknesses, long-term outlook and a Buy / Hold / Watch perspective.".to_string(),
                web_search: true,
            },
            AnalysisStage {
                name: "risk_assessment".to_string(),
                role: "Risk Analyst".to_string(),
                goal: "Identify financial and market risks present in the analyzed document.".to_string(),
                backstory: "You evaluate operational risk, market volatility, leverage exposure, and industry threats. Your focus is realistic downside scenarios and financial sustainability.".to_string(),
                instructions: "Assess risks present in the financial document at {file_path}.\n\nEvaluate:\n- Financial leverage\n- Market exposure\n- Operational risks\n- Industry threats".to_string(),
                expected_output: "A realistic risk analysis covering financial, market and strategic risks.".to_string(),
                web_search: false,
            },
        ]
    }
}
