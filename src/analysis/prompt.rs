/// Instruction sent ahead of the agreement text. The JSON shape here is the
/// contract [`super::parse::parse_analysis`] validates against.
const ANALYSIS_INSTRUCTIONS: &str = r#"Analyze this legal agreement and provide a structured response with the following:
1. A brief summary (2-3 sentences)
2. Key terms including payment terms, renewal conditions, termination clauses, and confidentiality terms
3. Potential risks or issues, with severity levels (low/medium/high)
4. The most appropriate category for this agreement
5. Your confidence score (0-1) in this analysis

Respond only with JSON in the following format:
{
  "summary": "string",
  "keyTerms": {
    "paymentTerms": "string",
    "renewalConditions": "string",
    "terminationClauses": "string",
    "confidentialityTerms": "string"
  },
  "risks": [
    {
      "type": "string",
      "description": "string",
      "severity": "low|medium|high"
    }
  ],
  "category": "string",
  "confidenceScore": number
}"#;

pub fn build_analysis_prompt(content: &str) -> String {
    format!("{ANALYSIS_INSTRUCTIONS}\n\nAgreement content:\n{content}")
}
